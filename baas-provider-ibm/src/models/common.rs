//! Value objects shared by policies and runs

use baas_core::attr_model;

attr_model! {
    /// How long a snapshot is kept
    pub struct Retention {
        /// Days, Weeks, Months or Years (Minutes or Hours for CDP)
        pub unit: String,
        pub duration: i64,
        pub data_lock_config: Option<DataLockConfig>,
    }
}

attr_model! {
    /// WORM retention applied on top of a retention
    pub struct DataLockConfig {
        /// Administrative or Compliance
        pub mode: String,
        pub unit: String,
        pub duration: i64,
        pub enable_worm_on_external_target: Option<bool>,
    }
}

attr_model! {
    /// Data lock state of a produced snapshot or copy
    pub struct DataLockConstraints {
        pub mode: Option<String>,
        pub expiry_time_usecs: Option<i64>,
    }
}

attr_model! {
    pub struct Frequency {
        pub frequency: i64,
    }
}

attr_model! {
    pub struct WeekSchedule {
        pub day_of_week: Vec<String>,
    }
}

attr_model! {
    pub struct MonthSchedule {
        pub day_of_week: Option<Vec<String>>,
        /// First, Second, Third, Fourth or Last
        pub week_of_month: Option<String>,
        pub day_of_month: Option<i64>,
    }
}

attr_model! {
    pub struct YearSchedule {
        /// First or Last
        pub day_of_year: String,
    }
}

attr_model! {
    /// How often a backup runs.
    ///
    /// `unit` selects the granularity; the matching sub-schedule carries the
    /// details. See [`Schedule::granularity`].
    pub struct Schedule {
        pub unit: String,
        pub minute_schedule: Option<Frequency>,
        pub hour_schedule: Option<Frequency>,
        pub day_schedule: Option<Frequency>,
        pub week_schedule: Option<WeekSchedule>,
        pub month_schedule: Option<MonthSchedule>,
        pub year_schedule: Option<YearSchedule>,
    }
}

/// Typed view of the sub-schedule selected by a schedule's unit
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Granularity<'a> {
    Minutes(Option<&'a Frequency>),
    Hours(Option<&'a Frequency>),
    Days(Option<&'a Frequency>),
    Weeks(Option<&'a WeekSchedule>),
    Months(Option<&'a MonthSchedule>),
    Years(Option<&'a YearSchedule>),
    /// Units without a sub-schedule (e.g. ProtectOnce)
    Other(&'a str),
}

impl Schedule {
    /// A schedule with the given unit and no sub-schedules
    pub fn with_unit(unit: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            ..Default::default()
        }
    }

    /// The sub-schedule that the API will use for this unit
    pub fn granularity(&self) -> Granularity<'_> {
        match self.unit.as_str() {
            "Minutes" => Granularity::Minutes(self.minute_schedule.as_ref()),
            "Hours" => Granularity::Hours(self.hour_schedule.as_ref()),
            "Days" => Granularity::Days(self.day_schedule.as_ref()),
            "Weeks" => Granularity::Weeks(self.week_schedule.as_ref()),
            "Months" => Granularity::Months(self.month_schedule.as_ref()),
            "Years" => Granularity::Years(self.year_schedule.as_ref()),
            other => Granularity::Other(other),
        }
    }

    /// Names of the sub-schedules that are populated
    pub fn populated(&self) -> Vec<&'static str> {
        [
            ("minute_schedule", self.minute_schedule.is_some()),
            ("hour_schedule", self.hour_schedule.is_some()),
            ("day_schedule", self.day_schedule.is_some()),
            ("week_schedule", self.week_schedule.is_some()),
            ("month_schedule", self.month_schedule.is_some()),
            ("year_schedule", self.year_schedule.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, set)| set.then_some(name))
        .collect()
    }

    /// Name of the sub-schedule matching `unit`, if the unit has one
    pub fn expected_sub_schedule(&self) -> Option<&'static str> {
        match self.granularity() {
            Granularity::Minutes(_) => Some("minute_schedule"),
            Granularity::Hours(_) => Some("hour_schedule"),
            Granularity::Days(_) => Some("day_schedule"),
            Granularity::Weeks(_) => Some("week_schedule"),
            Granularity::Months(_) => Some("month_schedule"),
            Granularity::Years(_) => Some("year_schedule"),
            Granularity::Other(_) => None,
        }
    }
}

attr_model! {
    /// Schedule of a copy to a target or of an extended retention
    pub struct TargetSchedule {
        /// Runs, Hours, Days, Weeks, Months or Years
        pub unit: String,
        pub frequency: Option<i64>,
    }
}

attr_model! {
    pub struct Tier {
        pub move_after_unit: Option<String>,
        pub move_after: Option<i64>,
        pub tier_type: String,
    }
}

attr_model! {
    pub struct Tiers {
        pub tiers: Vec<Tier>,
    }
}

attr_model! {
    /// Cloud storage tiering of an archival target
    pub struct TierSettings {
        /// AWS, Azure, Oracle or Google
        pub cloud_platform: String,
        pub aws_tiering: Option<Tiers>,
        pub azure_tiering: Option<Tiers>,
        pub google_tiering: Option<Tiers>,
        pub oracle_tiering: Option<Tiers>,
    }
}

attr_model! {
    pub struct RunTimeout {
        pub timeout_mins: Option<i64>,
        /// kRegular, kFull, kLog, kSystem, kHydrateCDP or kStorageArraySnapshot
        pub backup_type: Option<String>,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn granularity_follows_unit() {
        let mut schedule = Schedule::with_unit("Days");
        assert_eq!(schedule.granularity(), Granularity::Days(None));

        schedule.day_schedule = Some(Frequency { frequency: 1 });
        assert_eq!(
            schedule.granularity(),
            Granularity::Days(Some(&Frequency { frequency: 1 }))
        );

        assert_eq!(
            Schedule::with_unit("ProtectOnce").granularity(),
            Granularity::Other("ProtectOnce")
        );
    }

    #[test]
    fn populated_lists_set_sub_schedules() {
        let schedule = Schedule {
            unit: "Weeks".to_string(),
            day_schedule: Some(Frequency { frequency: 1 }),
            week_schedule: Some(WeekSchedule {
                day_of_week: vec!["Sunday".to_string()],
            }),
            ..Default::default()
        };
        assert_eq!(schedule.populated(), vec!["day_schedule", "week_schedule"]);
        assert_eq!(schedule.expected_sub_schedule(), Some("week_schedule"));
    }
}
