//! CGE version compatibility rules.

/// CGE language version this parser understands, as `MAJOR.MINOR`, or the
/// literal `dev` for unreleased builds.
pub const PARSER_VERSION: &str = "0.5";

/// Whether a file declaring `file_version` can be parsed by a parser
/// speaking `parser_version`.
///
/// `dev` is compatible with everything. Otherwise the majors must match
/// exactly; pre-1.0 versions additionally need an exact minor match; from
/// 1.0 on, the parser's minor must be at least the file's. Versions whose
/// minor component is not a number, or that are missing the dot entirely,
/// are incompatible.
pub fn is_compatible(file_version: &str, parser_version: &str) -> bool {
    if parser_version == "dev" {
        return true;
    }

    let Some((file_major, file_minor)) = file_version.split_once('.') else {
        return false;
    };
    let Some((parser_major, parser_minor)) = parser_version.split_once('.') else {
        return false;
    };

    if file_major != parser_major {
        return false;
    }
    if parser_major == "0" && file_minor != parser_minor {
        return false;
    }

    let Ok(file_minor) = file_minor.parse::<u32>() else {
        return false;
    };
    let Ok(parser_minor) = parser_minor.parse::<u32>() else {
        return false;
    };
    parser_minor >= file_minor
}
