//! Finished scan results, the only input the sink needs.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// One detected CVE with whatever enrichment was available for the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CveSummary {
    pub cve_id: String,
    /// `None` when the CVE dictionary was unavailable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cvss_score: Option<f64>,
    #[serde(default)]
    pub summary: String,
    /// Public exploit codes (exploit index).
    #[serde(default)]
    pub exploit_count: usize,
    /// Metasploit modules (exploit-module index).
    #[serde(default)]
    pub module_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    High,
    Medium,
    Low,
    Unknown,
}

impl CveSummary {
    pub fn severity(&self) -> Severity {
        match self.cvss_score {
            Some(s) if s >= 7.0 => Severity::High,
            Some(s) if s >= 4.0 => Severity::Medium,
            Some(s) if s > 0.0 => Severity::Low,
            _ => Severity::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    pub server_name: String,
    pub family: String,
    pub release: String,
    pub scanned_at: DateTime<Utc>,
    #[serde(default)]
    pub cves: Vec<CveSummary>,
}

impl ScanResult {
    /// `{scanned_at}/{server_name}`; the object-name stem for this result.
    pub fn report_key_name(&self) -> String {
        format!("{}/{}", timestamp_key(&self.scanned_at), self.server_name)
    }

    /// (high, medium, low, unknown)
    pub fn severity_counts(&self) -> (usize, usize, usize, usize) {
        let mut counts = (0, 0, 0, 0);
        for cve in &self.cves {
            match cve.severity() {
                Severity::High => counts.0 += 1,
                Severity::Medium => counts.1 += 1,
                Severity::Low => counts.2 += 1,
                Severity::Unknown => counts.3 += 1,
            }
        }
        counts
    }
}

/// RFC 3339 at second precision with a `Z` suffix.
pub fn timestamp_key(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_report_key_name_and_severity() {
        let result = ScanResult {
            server_name: "web01".to_string(),
            family: "debian".to_string(),
            release: "12".to_string(),
            scanned_at: Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap(),
            cves: vec![
                CveSummary {
                    cve_id: "CVE-2024-0001".to_string(),
                    cvss_score: Some(9.8),
                    summary: String::new(),
                    exploit_count: 1,
                    module_count: 0,
                },
                CveSummary {
                    cve_id: "CVE-2024-0002".to_string(),
                    cvss_score: None,
                    summary: String::new(),
                    exploit_count: 0,
                    module_count: 0,
                },
            ],
        };
        assert_eq!(result.report_key_name(), "2024-03-01T09:30:00Z/web01");
        assert_eq!(result.severity_counts(), (1, 0, 0, 1));
    }
}
