//! Timezone name resolution.
//!
//! `convertFromUTC` and `convertToUTC` accept either IANA names
//! (`America/Los_Angeles`) or Windows names (`Pacific Standard Time`). The
//! Windows names map to a representative IANA zone. The built-in table is
//! loaded on first use and never changes; tests and hosts may supply their own
//! through [`Options::timezones`](crate::Options::timezones).

use std::collections::HashMap;

use chrono_tz::Tz;
use once_cell::sync::Lazy;

static GLOBAL: Lazy<TimeZoneTable> = Lazy::new(|| TimeZoneTable::from_pairs(WINDOWS_ZONES.iter().copied()));

const WINDOWS_ZONES: &[(&str, &str)] = &[
    ("Dateline Standard Time", "Etc/GMT+12"),
    ("Hawaiian Standard Time", "Pacific/Honolulu"),
    ("Alaskan Standard Time", "America/Anchorage"),
    ("Pacific Standard Time", "America/Los_Angeles"),
    ("US Mountain Standard Time", "America/Phoenix"),
    ("Mountain Standard Time", "America/Denver"),
    ("Central America Standard Time", "America/Guatemala"),
    ("Central Standard Time", "America/Chicago"),
    ("Mexico Standard Time", "America/Mexico_City"),
    ("Canada Central Standard Time", "America/Regina"),
    ("SA Pacific Standard Time", "America/Bogota"),
    ("Eastern Standard Time", "America/New_York"),
    ("Atlantic Standard Time", "America/Halifax"),
    ("Newfoundland Standard Time", "America/St_Johns"),
    ("E. South America Standard Time", "America/Sao_Paulo"),
    ("Argentina Standard Time", "America/Argentina/Buenos_Aires"),
    ("UTC", "Etc/UTC"),
    ("GMT Standard Time", "Europe/London"),
    ("Greenwich Standard Time", "Atlantic/Reykjavik"),
    ("W. Europe Standard Time", "Europe/Berlin"),
    ("Central Europe Standard Time", "Europe/Budapest"),
    ("Romance Standard Time", "Europe/Paris"),
    ("Central European Standard Time", "Europe/Warsaw"),
    ("W. Central Africa Standard Time", "Africa/Lagos"),
    ("GTB Standard Time", "Europe/Bucharest"),
    ("Egypt Standard Time", "Africa/Cairo"),
    ("South Africa Standard Time", "Africa/Johannesburg"),
    ("FLE Standard Time", "Europe/Helsinki"),
    ("Israel Standard Time", "Asia/Jerusalem"),
    ("Arab Standard Time", "Asia/Riyadh"),
    ("Russian Standard Time", "Europe/Moscow"),
    ("Iran Standard Time", "Asia/Tehran"),
    ("Arabian Standard Time", "Asia/Dubai"),
    ("Pakistan Standard Time", "Asia/Karachi"),
    ("India Standard Time", "Asia/Kolkata"),
    ("Nepal Standard Time", "Asia/Kathmandu"),
    ("Bangladesh Standard Time", "Asia/Dhaka"),
    ("SE Asia Standard Time", "Asia/Bangkok"),
    ("China Standard Time", "Asia/Shanghai"),
    ("Singapore Standard Time", "Asia/Singapore"),
    ("Taipei Standard Time", "Asia/Taipei"),
    ("Tokyo Standard Time", "Asia/Tokyo"),
    ("Korea Standard Time", "Asia/Seoul"),
    ("AUS Central Standard Time", "Australia/Darwin"),
    ("AUS Eastern Standard Time", "Australia/Sydney"),
    ("West Pacific Standard Time", "Pacific/Port_Moresby"),
    ("New Zealand Standard Time", "Pacific/Auckland"),
];

/// Windows timezone names mapped to IANA zones.
#[derive(Debug, Clone, Default)]
pub struct TimeZoneTable {
    windows_to_iana: HashMap<String, Tz>,
}

impl TimeZoneTable {
    /// The built-in table.
    pub fn global() -> &'static TimeZoneTable {
        &GLOBAL
    }

    /// Build a table from `(windows name, IANA name)` pairs. Pairs whose IANA
    /// name is unknown are skipped.
    pub fn from_pairs<W: AsRef<str>, I: AsRef<str>>(pairs: impl IntoIterator<Item = (W, I)>) -> Self {
        let windows_to_iana = pairs
            .into_iter()
            .filter_map(|(windows, iana)| {
                let tz = iana.as_ref().parse::<Tz>().ok()?;
                Some((windows.as_ref().to_ascii_lowercase(), tz))
            })
            .collect();
        TimeZoneTable { windows_to_iana }
    }

    /// Resolve an IANA name, or a Windows name case-insensitively.
    pub fn resolve(&self, name: &str) -> Option<Tz> {
        let name = name.trim();
        name.parse::<Tz>()
            .ok()
            .or_else(|| self.windows_to_iana.get(&name.to_ascii_lowercase()).copied())
    }

    /// The IANA name a Windows name maps to.
    pub fn iana_name(&self, windows: &str) -> Option<&'static str> {
        self.windows_to_iana
            .get(&windows.trim().to_ascii_lowercase())
            .map(|tz| tz.name())
    }

    pub fn len(&self) -> usize {
        self.windows_to_iana.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows_to_iana.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolves_both_conventions() {
        let table = TimeZoneTable::global();
        assert_eq!(table.resolve("Pacific Standard Time"), Some(Tz::America__Los_Angeles));
        assert_eq!(table.resolve("pacific standard time"), Some(Tz::America__Los_Angeles));
        assert_eq!(table.resolve("Asia/Tokyo"), Some(Tz::Asia__Tokyo));
        assert_eq!(table.resolve("Nowhere Standard Time"), None);
    }

    #[test]
    fn test_injected_table() {
        let table = TimeZoneTable::from_pairs([("Office Time", "Europe/Paris"), ("Bad", "Not/AZone")]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.iana_name("office time"), Some("Europe/Paris"));
    }
}
