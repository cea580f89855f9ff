//! Coordinate reference system identifiers.
//!
//! The core never interprets a CRS; it only carries the identifier from a
//! source collection to its destination and compares identifiers to decide
//! whether a coordinate transform is needed.

use std::fmt;

/// Keywords that open a WKT1 or WKT2 CRS definition.
const WKT_KEYWORDS: &[&str] = &[
    "PROJCS",
    "GEOGCS",
    "GEOCCS",
    "COMPD_CS",
    "VERT_CS",
    "LOCAL_CS",
    "PROJCRS",
    "GEOGCRS",
    "GEODCRS",
    "BASEGEOGCRS",
    "COMPOUNDCRS",
    "BOUNDCRS",
    "VERTCRS",
    "ENGCRS",
];

/// Opaque CRS identifier attached to a geometric collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Crs {
    /// An EPSG code, e.g. `EPSG:28350`
    Epsg(u32),
    /// Any other `authority:code` pair, e.g. `ESRI:102003`
    Authority {
        /// Upper-cased authority name
        authority: String,
        /// Code within the authority
        code: String,
    },
    /// A full WKT definition
    Wkt(String),
}

impl Crs {
    /// Parse an identifier in one of the accepted spellings.
    ///
    /// Accepts WKT text, `authority:code` pairs (EPSG codes are normalised to
    /// [`Crs::Epsg`]) and bare EPSG integers. Blank or unrecognised input
    /// yields `None`, which callers treat as "no CRS".
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let upper = text.to_ascii_uppercase();
        if WKT_KEYWORDS.iter().any(|kw| upper.starts_with(kw)) {
            return Some(Self::Wkt(text.to_string()));
        }

        if let Ok(code) = text.parse::<u32>() {
            return Some(Self::Epsg(code));
        }

        let (authority, code) = text.split_once(':')?;
        let authority = authority.trim().to_ascii_uppercase();
        let code = code.trim();
        if authority.is_empty() || code.is_empty() {
            return None;
        }
        if authority == "EPSG"
            && let Ok(code) = code.parse::<u32>()
        {
            return Some(Self::Epsg(code));
        }
        Some(Self::Authority {
            authority,
            code: code.to_string(),
        })
    }

    /// The `authority:code` identifier, `None` for WKT definitions.
    #[must_use]
    pub fn authid(&self) -> Option<String> {
        match self {
            Self::Epsg(code) => Some(format!("EPSG:{code}")),
            Self::Authority { authority, code } => Some(format!("{authority}:{code}")),
            Self::Wkt(_) => None,
        }
    }

    #[must_use]
    pub fn epsg(&self) -> Option<u32> {
        match self {
            Self::Epsg(code) => Some(*code),
            _ => None,
        }
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Epsg(code) => write!(f, "EPSG:{code}"),
            Self::Authority { authority, code } => write!(f, "{authority}:{code}"),
            Self::Wkt(wkt) => f.write_str(wkt),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_epsg_spellings() {
        assert_eq!(Crs::parse("EPSG:28350"), Some(Crs::Epsg(28350)));
        assert_eq!(Crs::parse("epsg: 4326"), Some(Crs::Epsg(4326)));
        assert_eq!(Crs::parse("3857"), Some(Crs::Epsg(3857)));
    }

    #[test]
    fn parses_other_authorities() {
        assert_eq!(
            Crs::parse("esri:102003"),
            Some(Crs::Authority {
                authority: "ESRI".to_string(),
                code: "102003".to_string()
            })
        );
        assert_eq!(
            Crs::parse("ESRI:102003").and_then(|crs| crs.authid()),
            Some("ESRI:102003".to_string())
        );
    }

    #[test]
    fn parses_wkt() {
        let wkt = r#"PROJCS["GDA94 / MGA zone 50",GEOGCS["GDA94"]]"#;
        let crs = Crs::parse(wkt).unwrap();
        assert_eq!(crs, Crs::Wkt(wkt.to_string()));
        assert_eq!(crs.authid(), None);
        assert_eq!(crs.to_string(), wkt);
    }

    #[test]
    fn rejects_blank_and_garbage() {
        assert_eq!(Crs::parse(""), None);
        assert_eq!(Crs::parse("   "), None);
        assert_eq!(Crs::parse("not a crs"), None);
        assert_eq!(Crs::parse(":123"), None);
    }
}
