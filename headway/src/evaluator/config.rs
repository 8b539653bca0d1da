use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::evaluator::cache_policy::CachePolicy;
use crate::evaluator::calendar::ServiceDay;
use crate::evaluator::rider_filter::RiderFilter;

/// per-analysis settings, fixed once and reused across every query of a
/// solve. mirrors the parameter set a routing layer passes in when it
/// attaches the evaluator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// when true, queries run against the concrete analysis date
    /// (exceptions and validity ranges apply); when false, against its
    /// generic weekday (weekly patterns only)
    #[serde(default)]
    pub use_specific_date: bool,
    /// when true, the schedule cache reloads before every solve batch
    /// instead of once per process
    #[serde(default)]
    pub cache_every_solve: bool,
    #[serde(flatten)]
    pub filter: RiderFilter,
}

impl AnalysisConfig {
    pub fn cache_policy(&self) -> CachePolicy {
        if self.cache_every_solve {
            CachePolicy::EverySolve
        } else {
            CachePolicy::OncePerProcess
        }
    }

    /// converts the analysis date into the query day for this analysis
    /// mode: the date itself, or its weekday when `use_specific_date` is
    /// off.
    pub fn service_day(&self, date: NaiveDate) -> ServiceDay {
        if self.use_specific_date {
            ServiceDay::Date(date)
        } else {
            ServiceDay::Weekday(date.weekday())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    #[test]
    fn test_service_day_follows_use_specific_date() {
        let date = NaiveDate::from_ymd_opt(2023, 6, 14).unwrap(); // a Wednesday

        let specific = AnalysisConfig {
            use_specific_date: true,
            ..Default::default()
        };
        assert_eq!(specific.service_day(date), ServiceDay::Date(date));

        let generic = AnalysisConfig::default();
        assert_eq!(generic.service_day(date), ServiceDay::Weekday(Weekday::Wed));
    }

    #[test]
    fn test_cache_policy_flag_mapping() {
        let config = AnalysisConfig {
            cache_every_solve: true,
            ..Default::default()
        };
        assert_eq!(config.cache_policy(), CachePolicy::EverySolve);
        assert_eq!(
            AnalysisConfig::default().cache_policy(),
            CachePolicy::OncePerProcess
        );
    }

    #[test]
    fn test_analysis_config_deserializes_with_flattened_filter() {
        let json = r#"{
            "use_specific_date": true,
            "exclude_route_ids": ["r9"],
            "require_wheelchair_accessible": true
        }"#;
        let config: AnalysisConfig =
            serde_json::from_str(json).expect("config should deserialize");
        assert!(config.use_specific_date);
        assert!(!config.cache_every_solve);
        assert!(config.filter.exclude_route_ids.contains("r9"));
        assert!(config.filter.require_wheelchair_accessible);
        assert!(!config.filter.require_bikes_allowed);
    }
}
