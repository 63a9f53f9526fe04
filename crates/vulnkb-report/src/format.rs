//! Plain-text report variants.

use crate::model::ScanResult;
use std::fmt::Write;

/// One line per server: name, totals by severity, OS.
pub fn one_line_summary(results: &[ScanResult]) -> String {
    let mut out = String::new();
    for r in results {
        let (high, medium, low, unknown) = r.severity_counts();
        let _ = writeln!(
            out,
            "{}\tTotal: {} (High:{} Medium:{} Low:{} ?:{})\t{} {}",
            r.server_name,
            r.cves.len(),
            high,
            medium,
            low,
            unknown,
            r.family,
            r.release
        );
    }
    out
}

/// Short list: one row per CVE.
pub fn list(r: &ScanResult) -> String {
    let mut out = format!("{} ({} {})\n", r.server_name, r.family, r.release);
    if r.cves.is_empty() {
        out.push_str("No CVE-IDs are found in updatable packages.\n");
        return out;
    }
    for cve in &r.cves {
        let score = cve
            .cvss_score
            .map(|s| format!("{:.1}", s))
            .unwrap_or_else(|| "?".to_string());
        let _ = writeln!(
            out,
            "{:<18} {:>4}  exploits:{} modules:{}",
            cve.cve_id, score, cve.exploit_count, cve.module_count
        );
    }
    out
}

/// Full text: header plus every CVE with its summary.
pub fn full_text(r: &ScanResult) -> String {
    let mut out = format!(
        "{}\n{}\n",
        r.report_key_name(),
        "=".repeat(r.report_key_name().len())
    );
    out.push_str(&one_line_summary(std::slice::from_ref(r)));
    for cve in &r.cves {
        out.push('\n');
        let _ = writeln!(out, "{}", cve.cve_id);
        if let Some(score) = cve.cvss_score {
            let _ = writeln!(out, "  CVSS:     {:.1}", score);
        }
        if !cve.summary.is_empty() {
            let _ = writeln!(out, "  Summary:  {}", cve.summary);
        }
        let _ = writeln!(
            out,
            "  Exploits: {}  Metasploit modules: {}",
            cve.exploit_count, cve.module_count
        );
    }
    out
}
