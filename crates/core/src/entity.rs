use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::VigilError;

/// Alert urgency. Ordering follows urgency, so `Critical` is the maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
            Severity::Critical => "CRITICAL",
        }
    }

    pub fn is_critical(&self) -> bool {
        matches!(self, Severity::Critical)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = VigilError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INFO" => Ok(Severity::Info),
            "LOW" => Ok(Severity::Low),
            "MEDIUM" => Ok(Severity::Medium),
            "HIGH" => Ok(Severity::High),
            "CRITICAL" => Ok(Severity::Critical),
            _ => Err(VigilError::UnknownSeverity(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TargetType {
    Person,
    Vehicle,
}

impl std::fmt::Display for TargetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetType::Person => write!(f, "PERSON"),
            TargetType::Vehicle => write!(f, "VEHICLE"),
        }
    }
}

impl FromStr for TargetType {
    type Err = VigilError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PERSON" => Ok(TargetType::Person),
            "VEHICLE" => Ok(TargetType::Vehicle),
            _ => Err(VigilError::UnknownTargetType(s.to_string())),
        }
    }
}

/// Coarse descriptive attributes of a tracked subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectAttributes {
    pub target_type: TargetType,
    #[serde(default)]
    pub colors: Vec<String>,
    /// Free-text descriptors ("backpack", "hooded", plate fragments).
    #[serde(default)]
    pub descriptors: Vec<String>,
}

impl SubjectAttributes {
    pub fn new(target_type: TargetType) -> Self {
        Self {
            target_type,
            colors: Vec::new(),
            descriptors: Vec::new(),
        }
    }

    pub fn with_colors<I, S>(mut self, colors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.colors = colors.into_iter().map(Into::into).collect();
        self
    }

    /// Case-insensitive substring match against any color.
    pub fn has_color(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.colors
            .iter()
            .any(|c| c.to_lowercase().contains(&needle))
    }

    /// Short human label, e.g. `PERSON (red, black)`.
    pub fn summary(&self) -> String {
        if self.colors.is_empty() {
            self.target_type.to_string()
        } else {
            format!("{} ({})", self.target_type, self.colors.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_orders_by_urgency() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Low > Severity::Info);
        assert_eq!(
            [Severity::Low, Severity::Critical, Severity::Info].iter().max(),
            Some(&Severity::Critical)
        );
    }

    #[test]
    fn severity_serializes_upper_case() {
        let json = serde_json::to_string(&Severity::Critical).unwrap();
        assert_eq!(json, "\"CRITICAL\"");
        let parsed: Severity = serde_json::from_str("\"MEDIUM\"").unwrap();
        assert_eq!(parsed, Severity::Medium);
    }

    #[test]
    fn severity_from_str_is_case_insensitive() {
        assert_eq!("high".parse::<Severity>().unwrap(), Severity::High);
        assert!("urgent".parse::<Severity>().is_err());
    }

    #[test]
    fn parse_errors_name_the_rejected_value() {
        assert_eq!(
            "urgent".parse::<Severity>(),
            Err(VigilError::UnknownSeverity("urgent".to_string()))
        );
        assert_eq!(
            "drone".parse::<TargetType>(),
            Err(VigilError::UnknownTargetType("drone".to_string()))
        );
    }

    #[test]
    fn has_color_matches_substring_ignoring_case() {
        let attrs = SubjectAttributes::new(TargetType::Person).with_colors(["Dark Red", "black"]);
        assert!(attrs.has_color("red"));
        assert!(attrs.has_color("BLACK"));
        assert!(!attrs.has_color("blue"));
    }

    #[test]
    fn summary_lists_colors() {
        let attrs = SubjectAttributes::new(TargetType::Vehicle).with_colors(["white"]);
        assert_eq!(attrs.summary(), "VEHICLE (white)");
        assert_eq!(SubjectAttributes::new(TargetType::Person).summary(), "PERSON");
    }
}
