// Per-domain visit statistics - pure logic.

use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StatsEntry {
    pub domain: String,
    pub visits: u64,
    /// Unix timestamp in milliseconds
    pub last_visit: i64,
    pub time: String,
}

/// Host of a navigated URL. Unparseable or host-less URLs yield `None`,
/// which means no stat is recorded.
pub fn domain_of(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()?
        .host_str()
        .filter(|h| !h.is_empty())
        .map(str::to_string)
}

/// Increment-or-insert, then keep the collection sorted by visits descending.
/// The sort is stable, so domains with equal counts keep their relative order.
pub fn record_visit(stats: &mut Vec<StatsEntry>, domain: &str, now_ms: i64) {
    match stats.iter_mut().find(|s| s.domain == domain) {
        Some(entry) => {
            entry.visits += 1;
            entry.last_visit = now_ms;
        }
        None => stats.push(StatsEntry {
            domain: domain.to_string(),
            visits: 1,
            last_visit: now_ms,
            time: "0m".to_string(),
        }),
    }
    stats.sort_by(|a, b| b.visits.cmp(&a.visits));
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn is_sorted_desc(stats: &[StatsEntry]) -> bool {
        stats.windows(2).all(|w| w[0].visits >= w[1].visits)
    }

    #[test]
    fn test_two_visits_to_new_domain() {
        let mut stats = Vec::new();
        record_visit(&mut stats, "example.com", 1);
        record_visit(&mut stats, "example.com", 2);
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].visits, 2);
        assert_eq!(stats[0].last_visit, 2);
        assert_eq!(stats[0].time, "0m");
    }

    #[test]
    fn test_collection_stays_sorted() {
        let mut stats = Vec::new();
        for domain in ["a.com", "b.com", "b.com", "c.com", "c.com", "c.com", "a.com"] {
            record_visit(&mut stats, domain, 0);
            assert!(is_sorted_desc(&stats));
        }
        let order: Vec<&str> = stats.iter().map(|s| s.domain.as_str()).collect();
        assert_eq!(order, vec!["c.com", "b.com", "a.com"]);
    }

    #[rstest]
    #[case("https://www.rust-lang.org/learn", Some("www.rust-lang.org"))]
    #[case("http://localhost:3000/", Some("localhost"))]
    #[case("not a url", None)]
    #[case("data:text/html,hi", None)]
    fn test_domain_of(#[case] url: &str, #[case] expected: Option<&str>) {
        assert_eq!(domain_of(url).as_deref(), expected);
    }

    #[test]
    fn test_wire_format() {
        let mut stats = Vec::new();
        record_visit(&mut stats, "a.com", 42);
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{"domain": "a.com", "visits": 1, "lastVisit": 42, "time": "0m"}])
        );
    }
}
