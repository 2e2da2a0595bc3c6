//! Text format for the usage file
//!
//! ```text
//! PACKAGE_MANAGER__PACKAGE_DEX_USAGE__1
//! com.example.app,1
//! #/data/user/0/com.example.app/code.dex
//! 0,1,arm64,arm
//! com.example.other,0
//! ...
//! ```
//!
//! A package line is `name,used_by_other_apps`. A line starting with `#`
//! names a secondary dex file and must be followed by
//! `owner_user_id,used_by_other_apps[,isa]*`. Booleans are `0` or `1`.

use crate::error::{DexUseError, DexUseResult};
use crate::isa::IsaSet;
use crate::usage::info::{DexUseInfo, PackageUseInfo, UserId};
use crate::usage::table::UsageMap;
use std::io::BufRead;
use tracing::{error, warn};

/// Current file format version
pub const VERSION: i32 = 1;

/// Prefix of the first line, followed directly by the version number
pub const VERSION_HEADER: &str = "PACKAGE_MANAGER__PACKAGE_DEX_USAGE__";

const SPLIT_CHAR: char = ',';
const DEX_LINE_CHAR: char = '#';

/// Encode a table snapshot.
///
/// Fails without producing output if any key could not be read back.
pub fn encode(packages: &UsageMap) -> DexUseResult<String> {
    let mut out = String::new();
    out.push_str(VERSION_HEADER);
    out.push_str(&VERSION.to_string());
    out.push('\n');

    for (name, package) in packages {
        check_package_name(name)?;
        out.push_str(name);
        out.push(SPLIT_CHAR);
        out.push_str(write_bool(package.used_by_other_apps));
        out.push('\n');

        for (dex_path, dex) in &package.dex_usage {
            check_dex_path(dex_path)?;
            if dex.loader_isas.is_empty() {
                return Err(DexUseError::InvalidKey {
                    kind: "dex path without loader ISAs",
                    key: dex_path.clone(),
                });
            }
            out.push(DEX_LINE_CHAR);
            out.push_str(dex_path);
            out.push('\n');
            out.push_str(&dex.owner_user_id.to_string());
            out.push(SPLIT_CHAR);
            out.push_str(write_bool(dex.used_by_other_apps));
            for isa in &dex.loader_isas {
                out.push(SPLIT_CHAR);
                out.push_str(isa);
            }
            out.push('\n');
        }
    }

    Ok(out)
}

/// Reject package names that would not survive a write and read back
pub fn check_package_name(name: &str) -> DexUseResult<()> {
    let unstorable = name.is_empty()
        || name.starts_with(DEX_LINE_CHAR)
        || name.contains(SPLIT_CHAR)
        || has_line_break(name);
    if unstorable {
        return Err(DexUseError::InvalidKey {
            kind: "package name",
            key: name.to_string(),
        });
    }
    Ok(())
}

/// Reject dex paths that would not survive a write and read back
pub fn check_dex_path(path: &str) -> DexUseResult<()> {
    if has_line_break(path) {
        return Err(DexUseError::InvalidKey {
            kind: "dex path",
            key: path.to_string(),
        });
    }
    Ok(())
}

fn has_line_break(key: &str) -> bool {
    key.contains(['\n', '\r'])
}

/// Parser position in the two-line record grammar
enum State {
    /// Expecting a package line or a dex path line
    Record,
    /// Saw `#path`, expecting its data line
    DexData { dex_path: String, path_line: usize },
}

/// Decode a usage file.
///
/// ISA tokens outside `isas` are dropped with a warning. Any structural
/// problem fails the whole decode.
pub fn decode<R: BufRead>(reader: R, isas: &IsaSet) -> DexUseResult<UsageMap> {
    let mut lines = reader.lines().enumerate();

    let header = match lines.next() {
        Some((_, line)) => line.map_err(|e| DexUseError::io("reading usage file header", e))?,
        None => return Err(DexUseError::MissingHeader),
    };
    check_header(&header)?;

    let mut data = UsageMap::new();
    let mut current: Option<String> = None;
    let mut state = State::Record;

    for (idx, line) in lines {
        let line_no = idx + 1;
        let line = line.map_err(|e| DexUseError::io("reading usage file", e))?;

        state = match state {
            State::DexData {
                dex_path,
                path_line,
            } => {
                let package = match current.as_ref() {
                    Some(name) => data.get_mut(name),
                    None => None,
                };
                let Some(package) = package else {
                    return Err(DexUseError::parse(path_line, "dex line before package line"));
                };
                if let Some(dex) = parse_dex_data(&line, line_no, isas)? {
                    package.dex_usage.insert(dex_path, dex);
                } else if isas.is_empty() {
                    error!(
                        "Ignoring dex path {} in usage file: no supported ISAs",
                        dex_path
                    );
                }
                State::Record
            }
            State::Record => {
                if let Some(dex_path) = line.strip_prefix(DEX_LINE_CHAR) {
                    if current.is_none() {
                        return Err(DexUseError::parse(
                            line_no,
                            "expected package line before dex line",
                        ));
                    }
                    State::DexData {
                        dex_path: dex_path.to_string(),
                        path_line: line_no,
                    }
                } else if line.is_empty() {
                    State::Record
                } else {
                    let (name, package) = parse_package(&line, line_no)?;
                    data.insert(name.clone(), package);
                    current = Some(name);
                    State::Record
                }
            }
        };
    }

    if let State::DexData { dex_path, path_line } = state {
        return Err(DexUseError::parse(
            path_line,
            format!("missing usage data for dex path {}", dex_path),
        ));
    }

    Ok(data)
}

fn check_header(line: &str) -> DexUseResult<()> {
    let version = line
        .strip_prefix(VERSION_HEADER)
        .ok_or_else(|| DexUseError::InvalidHeader(line.to_string()))?;
    let version: i32 = version
        .parse()
        .map_err(|_| DexUseError::InvalidHeader(line.to_string()))?;
    if version != VERSION {
        return Err(DexUseError::VersionMismatch {
            found: version,
            expected: VERSION,
        });
    }
    Ok(())
}

fn parse_package(line: &str, line_no: usize) -> DexUseResult<(String, PackageUseInfo)> {
    let fields = split_fields(line);
    let [name, flag] = fields.as_slice() else {
        return Err(DexUseError::parse(
            line_no,
            format!("invalid package line: {}", line),
        ));
    };

    let package = PackageUseInfo {
        used_by_other_apps: read_bool(flag, line_no)?,
        ..Default::default()
    };
    Ok((name.to_string(), package))
}

/// Returns `None` when no supported ISA is left and the record must be skipped
fn parse_dex_data(line: &str, line_no: usize, isas: &IsaSet) -> DexUseResult<Option<DexUseInfo>> {
    let fields = split_fields(line);
    if fields.len() < 3 {
        return Err(DexUseError::parse(
            line_no,
            format!("invalid dex usage line: {}", line),
        ));
    }

    let owner_user_id: UserId = fields[0].parse().map_err(|_| {
        DexUseError::parse(line_no, format!("invalid owner user id: {}", fields[0]))
    })?;
    let mut dex = DexUseInfo::new(owner_user_id, read_bool(fields[1], line_no)?);

    for isa in &fields[2..] {
        if isas.contains(isa) {
            dex.loader_isas.insert(isa.to_string());
        } else {
            warn!("Unsupported ISA when parsing usage file: {}", isa);
        }
    }

    if isas.is_empty() {
        return Ok(None);
    }
    if dex.loader_isas.is_empty() {
        warn!("Dropping dex record at line {}: no supported ISA left", line_no);
        return Ok(None);
    }
    Ok(Some(dex))
}

/// Split on commas, dropping trailing empty fields
fn split_fields(line: &str) -> Vec<&str> {
    let mut fields: Vec<&str> = line.split(SPLIT_CHAR).collect();
    while fields.last().is_some_and(|f| f.is_empty()) {
        fields.pop();
    }
    fields
}

fn write_bool(value: bool) -> &'static str {
    if value {
        "1"
    } else {
        "0"
    }
}

fn read_bool(token: &str, line_no: usize) -> DexUseResult<bool> {
    match token {
        "0" => Ok(false),
        "1" => Ok(true),
        _ => Err(DexUseError::parse(
            line_no,
            format!("unknown bool encoding: {}", token),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn isas() -> IsaSet {
        IsaSet::new(["arm", "arm64"])
    }

    fn sample() -> UsageMap {
        let mut dex = DexUseInfo::new(0, true);
        dex.loader_isas.insert("arm".to_string());
        dex.loader_isas.insert("arm64".to_string());

        let mut app = PackageUseInfo::default();
        app.dex_usage
            .insert("/data/user/0/com.example.app/code.dex".to_string(), dex);
        app.dex_usage.insert(
            "/data/user/10/com.example.app/extra.dex".to_string(),
            DexUseInfo::new(10, false).with_isa("arm"),
        );

        let other = PackageUseInfo {
            used_by_other_apps: true,
            ..Default::default()
        };

        UsageMap::from([
            ("com.example.app".to_string(), app),
            ("com.example.other".to_string(), other),
        ])
    }

    #[test]
    fn encode_layout() {
        let text = encode(&sample()).unwrap();
        let expected = "\
PACKAGE_MANAGER__PACKAGE_DEX_USAGE__1
com.example.app,0
#/data/user/0/com.example.app/code.dex
0,1,arm,arm64
#/data/user/10/com.example.app/extra.dex
10,0,arm
com.example.other,1
";
        assert_eq!(text, expected);
    }

    #[test]
    fn decode_recovers_encoded_table() {
        let table = sample();
        let decoded = decode(encode(&table).unwrap().as_bytes(), &isas()).unwrap();
        assert_eq!(decoded, table);
    }

    #[test]
    fn empty_table_encodes_to_header_only() {
        let text = encode(&UsageMap::new()).unwrap();
        assert_eq!(text, "PACKAGE_MANAGER__PACKAGE_DEX_USAGE__1\n");
        assert!(decode(text.as_bytes(), &isas()).unwrap().is_empty());
    }

    #[test]
    fn rejects_missing_header() {
        let err = decode("".as_bytes(), &isas()).unwrap_err();
        assert!(matches!(err, DexUseError::MissingHeader));
    }

    #[test]
    fn rejects_wrong_header() {
        let err = decode("pkg,1\n".as_bytes(), &isas()).unwrap_err();
        assert!(matches!(err, DexUseError::InvalidHeader(_)));

        let err = decode("PACKAGE_MANAGER__PACKAGE_DEX_USAGE__x\n".as_bytes(), &isas())
            .unwrap_err();
        assert!(matches!(err, DexUseError::InvalidHeader(_)));
    }

    #[test]
    fn rejects_other_version() {
        let err = decode(
            "PACKAGE_MANAGER__PACKAGE_DEX_USAGE__2\npkg,1\n".as_bytes(),
            &isas(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            DexUseError::VersionMismatch {
                found: 2,
                expected: 1
            }
        ));
    }

    #[test]
    fn rejects_dex_line_before_package() {
        let text = "PACKAGE_MANAGER__PACKAGE_DEX_USAGE__1\n#/data/a.dex\n0,0,arm\n";
        let err = decode(text.as_bytes(), &isas()).unwrap_err();
        assert!(matches!(err, DexUseError::Parse { line: 2, .. }));
    }

    #[test]
    fn rejects_short_dex_data_line() {
        let text = "PACKAGE_MANAGER__PACKAGE_DEX_USAGE__1\npkg,0\n#/data/a.dex\n0,0\n";
        let err = decode(text.as_bytes(), &isas()).unwrap_err();
        assert!(matches!(err, DexUseError::Parse { line: 4, .. }));
    }

    #[test]
    fn rejects_dangling_dex_path() {
        let text = "PACKAGE_MANAGER__PACKAGE_DEX_USAGE__1\npkg,0\n#/data/a.dex\n";
        let err = decode(text.as_bytes(), &isas()).unwrap_err();
        assert!(matches!(err, DexUseError::Parse { line: 3, .. }));
    }

    #[test]
    fn rejects_bad_package_line() {
        let text = "PACKAGE_MANAGER__PACKAGE_DEX_USAGE__1\npkg,0,extra\n";
        let err = decode(text.as_bytes(), &isas()).unwrap_err();
        assert!(matches!(err, DexUseError::Parse { line: 2, .. }));

        let text = "PACKAGE_MANAGER__PACKAGE_DEX_USAGE__1\npkg\n";
        assert!(decode(text.as_bytes(), &isas()).is_err());
    }

    #[test]
    fn rejects_bad_booleans() {
        let text = "PACKAGE_MANAGER__PACKAGE_DEX_USAGE__1\npkg,true\n";
        assert!(decode(text.as_bytes(), &isas()).is_err());

        let text = "PACKAGE_MANAGER__PACKAGE_DEX_USAGE__1\npkg,0\n#/a.dex\n0,2,arm\n";
        assert!(decode(text.as_bytes(), &isas()).is_err());
    }

    #[test]
    fn rejects_bad_owner() {
        let text = "PACKAGE_MANAGER__PACKAGE_DEX_USAGE__1\npkg,0\n#/a.dex\nroot,0,arm\n";
        let err = decode(text.as_bytes(), &isas()).unwrap_err();
        assert!(err.to_string().contains("owner user id"));
    }

    #[test]
    fn drops_unknown_isas_but_keeps_record() {
        let text = "PACKAGE_MANAGER__PACKAGE_DEX_USAGE__1\npkg,0\n#/a.dex\n0,1,mips,arm\n";
        let data = decode(text.as_bytes(), &isas()).unwrap();
        let dex = data["pkg"].dex("/a.dex").unwrap();
        assert!(dex.is_used_by_other_apps());
        assert_eq!(dex.loader_isas().len(), 1);
        assert!(dex.loader_isas().contains("arm"));
    }

    #[test]
    fn empty_vocabulary_drops_dex_records() {
        let text = "PACKAGE_MANAGER__PACKAGE_DEX_USAGE__1\npkg,1\n#/a.dex\n0,1,arm\n";
        let data = decode(text.as_bytes(), &IsaSet::default()).unwrap();
        assert!(data["pkg"].is_used_by_other_apps());
        assert!(data["pkg"].dex_usage().is_empty());
    }

    #[test]
    fn dex_path_may_contain_commas() {
        let mut package = PackageUseInfo::default();
        package.dex_usage.insert(
            "/data/odd,name.dex".to_string(),
            DexUseInfo::new(0, false).with_isa("arm"),
        );
        let table = UsageMap::from([("pkg".to_string(), package)]);
        let decoded = decode(encode(&table).unwrap().as_bytes(), &isas()).unwrap();
        assert_eq!(decoded, table);
    }

    #[test]
    fn record_with_only_unknown_isas_is_dropped() {
        let text = "PACKAGE_MANAGER__PACKAGE_DEX_USAGE__1\npkg,0\n#/a.dex\n0,1,mips\n#/b.dex\n0,0,arm\n";
        let data = decode(text.as_bytes(), &isas()).unwrap();
        assert!(data["pkg"].dex("/a.dex").is_none());
        assert!(data["pkg"].dex("/b.dex").is_some());

        // The surviving table must encode to something decodable again
        let again = decode(encode(&data).unwrap().as_bytes(), &isas()).unwrap();
        assert_eq!(again, data);
    }

    #[test]
    fn encode_refuses_unreadable_package_names() {
        for name in ["bad,pkg", "#hash", "two\nlines", "cr\r", ""] {
            let table = UsageMap::from([(name.to_string(), PackageUseInfo::default())]);
            let err = encode(&table).unwrap_err();
            assert!(
                matches!(err, DexUseError::InvalidKey { kind: "package name", .. }),
                "{:?} was encoded",
                name
            );
        }
    }

    #[test]
    fn encode_refuses_unreadable_dex_records() {
        let mut package = PackageUseInfo::default();
        package.dex_usage.insert(
            "/data/a\n#/data/b.dex".to_string(),
            DexUseInfo::new(0, false).with_isa("arm"),
        );
        let table = UsageMap::from([("pkg".to_string(), package)]);
        assert!(matches!(
            encode(&table).unwrap_err(),
            DexUseError::InvalidKey { kind: "dex path", .. }
        ));

        let mut package = PackageUseInfo::default();
        package
            .dex_usage
            .insert("/data/a.dex".to_string(), DexUseInfo::new(0, false));
        let table = UsageMap::from([("pkg".to_string(), package)]);
        assert!(encode(&table).is_err());
    }

    #[test]
    fn key_checks_accept_ordinary_names() {
        assert!(check_package_name("com.example.app").is_ok());
        assert!(check_package_name("pkg#1").is_ok());
        assert!(check_dex_path("/data/odd,name#x.dex").is_ok());
        assert!(check_dex_path("").is_ok());
    }

    #[test]
    fn skips_blank_lines() {
        let text = "PACKAGE_MANAGER__PACKAGE_DEX_USAGE__1\n\npkg,1\n\n";
        let data = decode(text.as_bytes(), &isas()).unwrap();
        assert_eq!(data.len(), 1);
    }

    mod roundtrip {
        use super::*;
        use proptest::prelude::*;
        use std::collections::BTreeSet;

        fn dex_info() -> impl Strategy<Value = DexUseInfo> {
            (
                -1i32..100,
                any::<bool>(),
                proptest::sample::subsequence(vec!["arm", "arm64"], 1..=2),
            )
                .prop_map(|(owner, used, isas)| DexUseInfo {
                    owner_user_id: owner,
                    used_by_other_apps: used,
                    loader_isas: isas.into_iter().map(str::to_string).collect::<BTreeSet<_>>(),
                })
        }

        fn package_info() -> impl Strategy<Value = PackageUseInfo> {
            (
                any::<bool>(),
                proptest::collection::btree_map("/data/[a-z0-9_.,#/ ]{1,24}", dex_info(), 0..4),
            )
                .prop_map(|(used, dex_usage)| PackageUseInfo {
                    used_by_other_apps: used,
                    dex_usage,
                })
        }

        proptest! {
            #[test]
            fn decode_inverts_encode(
                table in proptest::collection::btree_map(
                    "[a-zA-Z][a-zA-Z0-9_.#]{0,16}",
                    package_info(),
                    0..6,
                )
            ) {
                let text = encode(&table).unwrap();
                let decoded = decode(text.as_bytes(), &isas()).unwrap();
                prop_assert_eq!(decoded, table);
            }
        }
    }
}
