use time::{OffsetDateTime, UtcOffset};
use time_tz::{Offset, TimeZone};

/// Resolve a canonical timezone name, e.g. "America/Mexico_City", to the
/// UTC offset currently in effect there.
pub fn get_local_offset(canonical_timezone: &str) -> Option<UtcOffset> {
    time_tz::timezones::get_by_name(canonical_timezone)
        .map(|tz| tz.get_offset_utc(&OffsetDateTime::now_utc()).to_utc())
}

#[cfg(test)]
mod tests {
    use super::get_local_offset;

    #[test]
    fn resolves_utc() {
        let offset = get_local_offset("Etc/UTC").unwrap();

        assert!(offset.is_utc());
    }

    #[test]
    fn rejects_unknown_timezone() {
        assert_eq!(get_local_offset("Atlantis/Lost_City"), None);
    }
}
