use time::{Date, Duration};

/// Serde support for boundary dates: always `YYYY-MM-DD` in the user's civil
/// calendar, never a timestamp that could shift across a day boundary when
/// the store's clock differs from the device clock.
pub mod iso_date {
    use serde::{Deserialize, Deserializer, Serializer};
    use time::{format_description::FormatItem, macros::format_description, Date};

    pub(super) const FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

    pub fn serialize<S: Serializer>(date: &Date, serializer: S) -> Result<S::Ok, S::Error> {
        let s = date.format(&FORMAT).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Date, D::Error> {
        let s = String::deserialize(deserializer)?;
        Date::parse(&s, &FORMAT).map_err(serde::de::Error::custom)
    }

    pub mod option {
        use serde::{Deserialize, Deserializer, Serializer};
        use time::Date;

        use super::FORMAT;

        pub fn serialize<S: Serializer>(
            date: &Option<Date>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match date {
                Some(d) => {
                    let s = d.format(&FORMAT).map_err(serde::ser::Error::custom)?;
                    serializer.serialize_some(&s)
                }
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Date>, D::Error> {
            let s = Option::<String>::deserialize(deserializer)?;
            s.map(|s| Date::parse(&s, &FORMAT).map_err(serde::de::Error::custom))
                .transpose()
        }
    }
}

/// Server-clock fallback for requests that omit a civil date. Interactive
/// callers are expected to send their own `YYYY-MM-DD`; the engine never
/// shifts a caller-supplied date across a day boundary.
pub fn today_utc() -> Date {
    time::OffsetDateTime::now_utc().date()
}

/// Monday of the week containing `date`. Sunday folds to the *previous*
/// week's Monday, never to a week start of its own.
pub fn week_start(date: Date) -> Date {
    date - Duration::days(i64::from(date.weekday().number_days_from_monday()))
}

/// Sunday closing the week containing `date`.
pub fn week_end(date: Date) -> Date {
    week_start(date) + Duration::days(6)
}

/// Days left in the current week counting `date` itself.
pub fn days_remaining_in_week(date: Date) -> i64 {
    (week_end(date) - date).whole_days() + 1
}

/// Whole years elapsed since `birth_date`, decremented when the birthday has
/// not yet occurred in `on`'s year.
pub fn age_on(birth_date: Date, on: Date) -> i64 {
    let mut age = i64::from(on.year() - birth_date.year());
    if (on.month() as u8, on.day()) < (birth_date.month() as u8, birth_date.day()) {
        age -= 1;
    }
    age
}
