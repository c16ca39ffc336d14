/// Function and pseudo-column names the tailors recognise.
///
/// Lookups are case-insensitive; [`Keyword::as_str`] is the canonical
/// lowercase spelling and [`Keyword::sql`] the uppercase form emitted in
/// rewritten calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Charindex,
    Convert,
    Dateadd,
    Datepart,
    Datetime,
    Dual,
    Getdate,
    Len,
    Locate,
    Mid,
    Mod,
    Now,
    Rownum,
    Substring,
    Sysdate,
}

const ALL: [Keyword; 15] = [
    Keyword::Charindex,
    Keyword::Convert,
    Keyword::Dateadd,
    Keyword::Datepart,
    Keyword::Datetime,
    Keyword::Dual,
    Keyword::Getdate,
    Keyword::Len,
    Keyword::Locate,
    Keyword::Mid,
    Keyword::Mod,
    Keyword::Now,
    Keyword::Rownum,
    Keyword::Substring,
    Keyword::Sysdate,
];

impl Keyword {
    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Charindex => "charindex",
            Keyword::Convert => "convert",
            Keyword::Dateadd => "dateadd",
            Keyword::Datepart => "datepart",
            Keyword::Datetime => "datetime",
            Keyword::Dual => "dual",
            Keyword::Getdate => "getdate",
            Keyword::Len => "len",
            Keyword::Locate => "locate",
            Keyword::Mid => "mid",
            Keyword::Mod => "mod",
            Keyword::Now => "now",
            Keyword::Rownum => "rownum",
            Keyword::Substring => "substring",
            Keyword::Sysdate => "sysdate",
        }
    }

    pub fn sql(self) -> String {
        self.as_str().to_ascii_uppercase()
    }

    pub fn parse(name: &str) -> Option<Keyword> {
        ALL.iter().copied().find(|keyword| keyword.matches(name))
    }

    pub fn matches(self, name: &str) -> bool {
        self.as_str().eq_ignore_ascii_case(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_ignores_case() {
        assert_eq!(Keyword::parse("SubString"), Some(Keyword::Substring));
        assert_eq!(Keyword::parse("SYSDATE"), Some(Keyword::Sysdate));
        assert_eq!(Keyword::parse("substr"), None);
    }

    #[test]
    fn test_every_keyword_round_trips() {
        for keyword in ALL {
            assert_eq!(Keyword::parse(keyword.as_str()), Some(keyword));
            assert_eq!(Keyword::parse(&keyword.sql()), Some(keyword));
        }
    }
}
