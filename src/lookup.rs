//! Fixed code-to-label tables used by the record mapper.
//!
//! Each table is built once on first use and is read-only afterwards.
//! Location, collection, and format lookups fail open: a code missing from
//! the table is returned unchanged.

use lazy_static::lazy_static;
use std::collections::HashMap;

/// Content type used for any leader type code not in the table.
pub const DEFAULT_CONTENT_TYPE: &str = "Text";

/// Resolved location of online resources, which carry no physical format.
pub const INTERNET_RESOURCE: &str = "Internet Resource";

/// Format of holdings recorded as textual summaries, and the default format.
pub const PRINT_VOLUME: &str = "Print volume";

lazy_static! {
    static ref CONTENT_TYPES: HashMap<u8, &'static str> = HashMap::from([
        (b'c', "Musical score"),
        (b'd', "Musical score"),
        (b'e', "Cartographic material"),
        (b'f', "Cartographic material"),
        (b'g', "Moving image"),
        (b'i', "Sound recording"),
        (b'j', "Sound recording"),
        (b'k', "Still image"),
        (b'm', "Computer file"),
        (b'o', "Kit"),
        (b'p', "Mixed materials"),
        (b'r', "Object"),
    ]);

    static ref LOCATIONS: HashMap<&'static str, &'static str> = HashMap::from([
        ("HUM", "Hayden Library"),
        ("RBR", "Hayden Library"),
        ("SCI", "Hayden Library"),
        ("MIT50", "MIT Administrative Library"),
        ("ARC", "Institute Archives"),
        ("ACQ", "Institute Archives"),
        ("ENG", "Barker Library"),
        ("CAT", "Cataloging and Metadata Services"),
        ("DEW", "Dewey Library"),
        ("DIR", "Director's Office"),
        ("DOC", "Document Services"),
        ("ILB", "Interlibrary Borrowing"),
        ("LSA", "Library Storage Annex"),
        ("NET", INTERNET_RESOURCE),
        ("MUS", "Lewis Music Library"),
        ("PHY", "Physics Department Reading Room"),
        ("RTC", "Rotch Library"),
        ("RVC", "Rotch Visual Collections"),
        ("SPC", "Space Cntr: Ask library staff"),
        ("OFFIC", "Office delivery"),
    ]);

    static ref COLLECTIONS: HashMap<&'static str, &'static str> = HashMap::from([
        ("STACK", "Stacks"),
        ("ATLCS", "Atlas Case"),
        ("AUDBK", "Audiobooks"),
        ("BRWS", "Browsery"),
        ("CNSUS", "Census Collection"),
        ("CIRCD", "Service Desk"),
        ("DETEC", "Detective Fiction Collection"),
        ("EJ", "Electronic Journal"),
        ("GIS", "GIS Collection"),
        ("GOV", "Government Documents"),
        ("GRNVL", "Graphic Novel Collection"),
        ("HDCBX", "Harvard Depository Boxed Items"),
        ("ICPSR", "ICPSR Codebooks"),
        ("IMPLS", "Impulse Borrowing Display"),
        ("LSA4", "Journal Collection"),
        ("OVRSZ", "Oversize Materials"),
        ("LMTED", "Limited Access Collection"),
        ("MAPRM", "Map Room"),
        ("MFORM", "Microforms"),
        ("MEDIA", "Media"),
        ("NCIP", "BLC ILB Item"),
        ("NEWBK", "Science New Books Display"),
        ("NOLN1", "Noncirculating Collection 1"),
        ("NOLN2", "Noncirculating Collection 2"),
        ("NOLN3", "Noncirculating Collection 3"),
        ("OCC", "Off Campus Collection"),
        ("OCCBX", "Off Campus Collection Boxed Items"),
        ("OFFCT", "Offsite Cataloging"),
        ("PAMPH", "Pamphlet Collection"),
        ("REF", "Reference Collection"),
        ("RSERV", "Reserve Stacks"),
        ("SWING", "Basement Grammar Books"),
        ("TRAVL", "Travel Collection"),
        ("UNCAT", "Uncataloged Materials - see Librarian"),
        ("UNKNW", "Problems Materials - see Librarian"),
        ("WSTM", "Women in Science, Technology, and Medicine"),
    ]);

    /// Collections whose label depends on the holding location code.
    static ref SITE_COLLECTIONS: HashMap<&'static str, [&'static str; 3]> = HashMap::from([
        // [humanities, science, elsewhere]
        ("JRNAL", ["Humanities Journals", "Science Journals", "Journal Collection"]),
        (
            "PRECT",
            [
                "Humanities Pre-cataloged Collection",
                "Science Pre-cataloged Collection",
                "Pre-cataloged Collection",
            ],
        ),
    ]);

    static ref FORMATS: HashMap<&'static str, &'static str> = HashMap::from([
        ("BOOKS", PRINT_VOLUME),
        ("REGULAR", PRINT_VOLUME),
        ("ATLAS", "Atlas"),
        ("AUDIO", "Audio tape"),
        ("AUDTAPE", "Audio tape"),
        ("CD", "Compact disc"),
        ("CDROM", "CD-ROM"),
        ("DSKETTE", "Diskette"),
        ("DVD", "DVD-ROM"),
        ("FICHE", "Microfiche"),
        ("FOLIO", "Oversized print volume"),
        ("OVRSIZE", "Oversized print volume"),
        ("MAP", "Map sheet"),
        ("MFILM", "Microfilm"),
        ("RECORD", "Audio record"),
        ("SCORE", "Musical score"),
        ("SMALL", "Undersized print volume"),
        ("VDISC", "Videodisc"),
        ("VHS", "VHS"),
    ]);
}

/// Content type label for a leader type-of-record byte.
#[must_use]
pub fn content_type(code: u8) -> &'static str {
    CONTENT_TYPES
        .get(&code)
        .copied()
        .unwrap_or(DEFAULT_CONTENT_TYPE)
}

/// Literary form from the first extracted literary-form code.
///
/// `0`, `s`, and `e` are nonfiction, any other code is fiction, and a
/// missing code yields the empty string.
#[must_use]
pub fn literary_form(code: Option<&str>) -> &'static str {
    match code {
        None => "",
        Some("0" | "s" | "e") => "nonfiction",
        Some(_) => "fiction",
    }
}

/// Library name for a holding location code.
#[must_use]
pub fn location(code: &str) -> String {
    LOCATIONS
        .get(code)
        .map_or_else(|| code.to_string(), |name| (*name).to_string())
}

/// Collection name for a collection code held at location code `site`.
#[must_use]
pub fn collection(code: &str, site: &str) -> String {
    if let Some([humanities, science, elsewhere]) = SITE_COLLECTIONS.get(code) {
        return match site {
            "HUM" => humanities,
            "SCI" => science,
            _ => elsewhere,
        }
        .to_string();
    }
    COLLECTIONS
        .get(code)
        .map_or_else(|| code.to_string(), |name| (*name).to_string())
}

/// Physical format for a format code at a resolved location name.
///
/// Online resources have no physical format; unknown codes are print volumes.
#[must_use]
pub fn format(resolved_location: &str, code: &str) -> String {
    if resolved_location == INTERNET_RESOURCE {
        return String::new();
    }
    FORMATS.get(code).copied().unwrap_or(PRINT_VOLUME).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_is_total_over_all_bytes() {
        let known = b"cdefgijkmopr";
        for code in 0..=u8::MAX {
            let label = content_type(code);
            if known.contains(&code) {
                assert_ne!(label, DEFAULT_CONTENT_TYPE, "code {code}");
            } else {
                assert_eq!(label, DEFAULT_CONTENT_TYPE, "code {code}");
            }
        }
        assert_eq!(content_type(b'j'), "Sound recording");
        assert_eq!(content_type(b'a'), "Text");
    }

    #[test]
    fn test_literary_form() {
        assert_eq!(literary_form(None), "");
        assert_eq!(literary_form(Some("0")), "nonfiction");
        assert_eq!(literary_form(Some("s")), "nonfiction");
        assert_eq!(literary_form(Some("e")), "nonfiction");
        assert_eq!(literary_form(Some("1")), "fiction");
        assert_eq!(literary_form(Some("")), "fiction");
    }

    #[test]
    fn test_location_fails_open() {
        assert_eq!(location("HUM"), "Hayden Library");
        assert_eq!(location("NET"), INTERNET_RESOURCE);
        assert_eq!(location("ZZZ"), "ZZZ");
        assert_eq!(location(""), "");
    }

    #[test]
    fn test_collection_depends_on_site() {
        assert_eq!(collection("JRNAL", "HUM"), "Humanities Journals");
        assert_eq!(collection("JRNAL", "SCI"), "Science Journals");
        assert_eq!(collection("JRNAL", "ENG"), "Journal Collection");
        assert_eq!(collection("PRECT", "SCI"), "Science Pre-cataloged Collection");
        assert_eq!(collection("STACK", "HUM"), "Stacks");
        assert_eq!(collection("NEWCODE", "HUM"), "NEWCODE");
    }

    #[test]
    fn test_format() {
        assert_eq!(format("Barker Library", "DVD"), "DVD-ROM");
        assert_eq!(format("Barker Library", "UNKNOWN"), PRINT_VOLUME);
        assert_eq!(format("Barker Library", ""), PRINT_VOLUME);
        assert_eq!(format(INTERNET_RESOURCE, "DVD"), "");
    }
}
