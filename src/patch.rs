//! Embedded-query text patching.
//!
//! Query text is treated as an opaque string; the rewrite rules are pure
//! `&str -> String` functions with no driver dependency, wrapped by thin
//! driver-facing helpers. Two rules exist:
//!
//! - **ordinal**: `2026_S03` week tokens embedded in storage paths move to
//!   the successor week, preserving the year.
//! - **date-shift**: every ISO `YYYY-MM-DD` literal moves forward one week.
//!
//! Date shifting is a global literal substitution, not position-aware: a
//! date string appearing in an unrelated context is rewritten too. That is
//! the accepted approximation, preserved deliberately.

use anyhow::Result;
use chrono::{Duration, NaiveDate};
use regex::Regex;

use crate::config::{QueryRule, RuleKind};
use crate::driver::WorkbookDriver;
use crate::error::RotateError;
use crate::models::WEEK_STEP_DAYS;
use crate::resolve::week_tag;

/// Rewrite every `YYYY_S{old}` token to `YYYY_S{new}`, keeping the year.
///
/// Returns the rewritten text and the number of tokens rewritten.
pub fn rewrite_week_token(text: &str, old_week: u32, new_week: u32) -> (String, usize) {
    let pattern = format!(r"(\d{{4}})_{}", week_tag(old_week));
    let re = Regex::new(&pattern).expect("week token pattern is valid");

    let mut count = 0;
    let rewritten = re
        .replace_all(text, |caps: &regex::Captures| {
            count += 1;
            format!("{}_{}", &caps[1], week_tag(new_week))
        })
        .into_owned();
    (rewritten, count)
}

/// Shift every ISO date literal in `text` by `delta_days` days.
///
/// Tokens are found in the original text, then each old literal is
/// globally substituted by its shifted value. Date-shaped tokens that do
/// not parse as real dates are left untouched. Returns the rewritten text
/// and the number of distinct substitutions applied.
pub fn shift_dates(text: &str, delta_days: i64) -> (String, usize) {
    let re = Regex::new(r"\d{4}-\d{2}-\d{2}").expect("ISO date pattern is valid");
    let found: Vec<String> = re.find_iter(text).map(|m| m.as_str().to_string()).collect();

    let mut out = text.to_string();
    let mut shifted = 0;
    for token in found {
        let date = match NaiveDate::parse_from_str(&token, "%Y-%m-%d") {
            Ok(d) => d,
            Err(_) => continue,
        };
        if !out.contains(&token) {
            // Already rewritten via an earlier (duplicate) token.
            continue;
        }
        let new = (date + Duration::days(delta_days))
            .format("%Y-%m-%d")
            .to_string();
        out = out.replace(&token, &new);
        shifted += 1;
    }
    (out, shifted)
}

/// Apply one query rule to the open workbook.
///
/// Returns `Ok(true)` when the query text changed and was written back,
/// `Ok(false)` on the soft no-pattern-found case (warned, job continues),
/// and [`RotateError::QueryNotFound`] when no query carries the rule's
/// name; the caller decides whether that aborts anything.
pub fn patch_query(
    driver: &mut dyn WorkbookDriver,
    rule: &QueryRule,
    old_week: u32,
    new_week: u32,
) -> Result<bool> {
    let text = match driver.query_text(&rule.name)? {
        Some(text) => text,
        None => {
            let available = driver.query_names()?;
            return Err(RotateError::QueryNotFound {
                name: rule.name.clone(),
                available,
            }
            .into());
        }
    };

    let (patched, count) = match rule.rule {
        RuleKind::Ordinal => rewrite_week_token(&text, old_week, new_week),
        RuleKind::DateShift => shift_dates(&text, WEEK_STEP_DAYS),
    };

    if count == 0 {
        let wanted = match rule.rule {
            RuleKind::Ordinal => format!("{} token", week_tag(old_week)),
            RuleKind::DateShift => "date".to_string(),
        };
        eprintln!("  warning: no {} found in query '{}'", wanted, rule.name);
        return Ok(false);
    }

    if patched == text {
        return Ok(false);
    }

    driver.set_query_text(&rule.name, &patched)?;
    match rule.rule {
        RuleKind::Ordinal => println!(
            "  query '{}': {} token(s) {} -> {}",
            rule.name,
            count,
            week_tag(old_week),
            week_tag(new_week)
        ),
        RuleKind::DateShift => println!(
            "  query '{}': {} date(s) shifted by {} days",
            rule.name, count, WEEK_STEP_DAYS
        ),
    }
    Ok(true)
}

/// Repoint external links referencing linked artifact families.
///
/// Links whose path contains one of `linked_prefixes` get their
/// `_S{old}` token moved to `_S{new}`; a rewrite that leaves the path
/// unchanged is skipped so the driver sees no no-op calls. Per-link driver
/// failures are warnings, not job aborts. Returns how many links were
/// repointed.
pub fn repoint_links(
    driver: &mut dyn WorkbookDriver,
    linked_prefixes: &[String],
    old_week: u32,
    new_week: u32,
) -> Result<usize> {
    let links = driver.external_links()?;
    if links.is_empty() {
        println!("  no external links");
        return Ok(0);
    }

    let old_token = format!("_{}", week_tag(old_week));
    let new_token = format!("_{}", week_tag(new_week));
    let re = Regex::new(&regex::escape(&old_token)).expect("escaped link token is valid");

    let mut repointed = 0;
    for link in &links {
        if !linked_prefixes.iter().any(|p| link.contains(p.as_str())) {
            continue;
        }
        let new_link = re.replace_all(link, new_token.as_str()).into_owned();
        if new_link == *link {
            continue;
        }
        match driver.repoint_link(link, &new_link) {
            Ok(()) => {
                println!("  link {} -> {}", link, new_link);
                repointed += 1;
            }
            Err(e) => eprintln!("  warning: failed to repoint link {}: {:#}", link, e),
        }
    }
    Ok(repointed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver_json::{JsonDriver, WorkbookModel};

    #[test]
    fn week_token_rewrites_and_preserves_year() {
        let (out, count) = rewrite_week_token("Source/2026_S03/extract.csv", 3, 4);
        assert_eq!(out, "Source/2026_S04/extract.csv");
        assert_eq!(count, 1);
    }

    #[test]
    fn week_token_rewrites_every_year_variant() {
        let text = "2025_S03 and 2026_S03 but not 2026_S07";
        let (out, count) = rewrite_week_token(text, 3, 4);
        assert_eq!(out, "2025_S04 and 2026_S04 but not 2026_S07");
        assert_eq!(count, 2);
    }

    #[test]
    fn week_token_without_match_is_untouched() {
        let text = "Source/2026_S07/extract.csv";
        let (out, count) = rewrite_week_token(text, 3, 4);
        assert_eq!(out, text);
        assert_eq!(count, 0);
    }

    #[test]
    fn week_token_needs_a_year_prefix() {
        let (out, count) = rewrite_week_token("plain _S03 token", 3, 4);
        assert_eq!(out, "plain _S03 token");
        assert_eq!(count, 0);
    }

    #[test]
    fn dates_shift_one_week() {
        let text = r#"{"start":"2026-01-05","end":"2026-01-11"}"#;
        let (out, count) = shift_dates(text, 7);
        assert_eq!(out, r#"{"start":"2026-01-12","end":"2026-01-18"}"#);
        assert_eq!(count, 2);
    }

    #[test]
    fn date_shift_does_not_reshift_a_rotated_window() {
        // Running the rule again on the already-shifted text moves the
        // window forward once more; the original dates no longer appear.
        let (first, _) = shift_dates("from 2026-01-05 to 2026-01-05", 7);
        assert_eq!(first, "from 2026-01-12 to 2026-01-12");
        let (second, count) = shift_dates(&first, 7);
        assert_eq!(second, "from 2026-01-19 to 2026-01-19");
        assert_eq!(count, 1);
    }

    #[test]
    fn adjacent_window_dates_chain() {
        // 2026-01-05 + 7 = 2026-01-12, which is also the second token:
        // the second substitution picks up the first one's output. Source
        // behavior, preserved.
        let (out, count) = shift_dates("2026-01-05..2026-01-12", 7);
        assert_eq!(out, "2026-01-19..2026-01-19", "chained rewrite");
        assert_eq!(count, 2);
    }

    #[test]
    fn unparseable_date_token_is_skipped() {
        let (out, count) = shift_dates("real 2026-01-05, bogus 2026-99-99", 7);
        assert_eq!(out, "real 2026-01-12, bogus 2026-99-99");
        assert_eq!(count, 1);
    }

    #[test]
    fn no_dates_means_no_change() {
        let (out, count) = shift_dates("no window here", 7);
        assert_eq!(out, "no window here");
        assert_eq!(count, 0);
    }

    fn driver_with_queries(queries: &[(&str, &str)]) -> (tempfile::TempDir, JsonDriver) {
        let mut model = WorkbookModel::default();
        for (name, text) in queries {
            model.queries.insert(name.to_string(), text.to_string());
        }
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("WB_S03.xlsx");
        std::fs::write(&path, serde_json::to_string(&model).unwrap()).unwrap();
        let mut driver = JsonDriver::new();
        driver.open(&path).unwrap();
        (tmp, driver)
    }

    fn ordinal_rule(name: &str) -> QueryRule {
        QueryRule {
            name: name.to_string(),
            rule: RuleKind::Ordinal,
        }
    }

    #[test]
    fn patch_query_writes_back_only_on_change() {
        let (_tmp, mut driver) =
            driver_with_queries(&[("selligent_all", "Source/2026_S03.csv")]);

        let changed = patch_query(&mut driver, &ordinal_rule("selligent_all"), 3, 4).unwrap();
        assert!(changed);
        assert_eq!(
            driver.query_text("selligent_all").unwrap().as_deref(),
            Some("Source/2026_S04.csv")
        );

        // Second application finds no S03 token: soft failure, untouched.
        let changed = patch_query(&mut driver, &ordinal_rule("selligent_all"), 3, 4).unwrap();
        assert!(!changed);
        assert_eq!(
            driver.query_text("selligent_all").unwrap().as_deref(),
            Some("Source/2026_S04.csv")
        );
    }

    #[test]
    fn patch_query_reports_unknown_query_with_available_names() {
        let (_tmp, mut driver) = driver_with_queries(&[("piano_all", "x")]);
        let err = patch_query(&mut driver, &ordinal_rule("selligent_all"), 3, 4).unwrap_err();
        match err.downcast_ref::<RotateError>() {
            Some(RotateError::QueryNotFound { name, available }) => {
                assert_eq!(name, "selligent_all");
                assert_eq!(available, &vec!["piano_all".to_string()]);
            }
            other => panic!("expected QueryNotFound, got {:?}", other),
        }
    }

    #[test]
    fn patch_query_matches_names_case_insensitively() {
        let (_tmp, mut driver) =
            driver_with_queries(&[("Selligent_All", "Source/2026_S03.csv")]);
        let changed = patch_query(&mut driver, &ordinal_rule("selligent_all"), 3, 4).unwrap();
        assert!(changed);
    }

    #[test]
    fn date_shift_rule_moves_the_query_window() {
        let (_tmp, mut driver) = driver_with_queries(&[(
            "piano_all",
            r#"period=%7B"start":"2026-01-05","end":"2026-01-11"%7D"#,
        )]);
        let rule = QueryRule {
            name: "piano_all".to_string(),
            rule: RuleKind::DateShift,
        };
        let changed = patch_query(&mut driver, &rule, 3, 4).unwrap();
        assert!(changed);
        let text = driver.query_text("piano_all").unwrap().unwrap();
        assert!(text.contains("2026-01-12"));
        assert!(text.contains("2026-01-18"));
        assert!(!text.contains("2026-01-05"));
    }

    fn driver_with_links(links: &[&str]) -> (tempfile::TempDir, JsonDriver) {
        let mut model = WorkbookModel::default();
        model.external_links = links.iter().map(|s| s.to_string()).collect();
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("WB_S20.xlsx");
        std::fs::write(&path, serde_json::to_string(&model).unwrap()).unwrap();
        let mut driver = JsonDriver::new();
        driver.open(&path).unwrap();
        (tmp, driver)
    }

    #[test]
    fn links_with_configured_prefixes_are_repointed() {
        let (_tmp, mut driver) = driver_with_links(&[
            "C:/data/SUIVI_CRM/SUIVI_CRM_S20.xlsx",
            "C:/data/SUIVI_KPIS/SUIVI_KPIS_S20.xlsx",
            "C:/data/OTHER/OTHER_S20.xlsx",
        ]);
        let prefixes = vec!["SUIVI_CRM".to_string(), "SUIVI_KPIS".to_string()];
        let repointed = repoint_links(&mut driver, &prefixes, 20, 21).unwrap();
        assert_eq!(repointed, 2);
        assert_eq!(
            driver.external_links().unwrap(),
            vec![
                "C:/data/SUIVI_CRM/SUIVI_CRM_S21.xlsx",
                "C:/data/SUIVI_KPIS/SUIVI_KPIS_S21.xlsx",
                "C:/data/OTHER/OTHER_S20.xlsx",
            ]
        );
    }

    #[test]
    fn unchanged_links_are_skipped() {
        // Link matches a prefix but carries a different week: rewriting is
        // a no-op and the driver must not be called for it.
        let (_tmp, mut driver) = driver_with_links(&["C:/data/SUIVI_CRM/SUIVI_CRM_S19.xlsx"]);
        let prefixes = vec!["SUIVI_CRM".to_string()];
        let repointed = repoint_links(&mut driver, &prefixes, 20, 21).unwrap();
        assert_eq!(repointed, 0);
        assert_eq!(
            driver.external_links().unwrap(),
            vec!["C:/data/SUIVI_CRM/SUIVI_CRM_S19.xlsx"]
        );
    }
}
