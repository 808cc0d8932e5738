//! Export table listings.
//!
//! Reads the text printed by `dumpbin /exports`:
//!
//! ```text
//!     ordinal hint RVA      name
//!
//!           1    0 0001B2A0 ??0ImColor@@QEAA@H@Z = ??0ImColor@@QEAA@H@Z (public: __cdecl ImColor::ImColor(int))
//! ```
//!
//! Lines before the `ordinal` header, summary lines and exports without a
//! demangled form are ignored.

use crate::DemangleError;
use serde::{Deserialize, Serialize};

/// One exported symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolRecord {
    pub ordinal: u32,
    pub hint: u32,
    /// Relative virtual address.
    pub address: u64,
    pub mangled: String,
    /// Display string, without the surrounding parentheses.
    pub demangled: String,
}

/// Parse a full export listing, in table order.
pub fn parse_export_dump(text: &str) -> Result<Vec<SymbolRecord>, DemangleError> {
    let mut lines = text.lines().map(str::trim).skip_while(|l| !l.starts_with("ordinal"));
    if lines.next().is_none() {
        return Err(DemangleError::MissingHeader);
    }
    Ok(lines.filter_map(parse_export_line).collect())
}

/// Parse a single `ordinal hint rva name = name (demangled)` line.
pub fn parse_export_line(line: &str) -> Option<SymbolRecord> {
    let line = line.trim();
    let (ordinal, rest) = take_field(line)?;
    let (hint, rest) = take_field(rest)?;
    let (address, rest) = take_field(rest)?;

    let ordinal = ordinal.parse().ok()?;
    let hint = u32::from_str_radix(hint, 16).ok()?;
    let address = u64::from_str_radix(address, 16).ok()?;

    let (mangled, rest) = rest.split_once(" = ")?;
    if mangled.is_empty() || mangled.contains(char::is_whitespace) {
        return None;
    }
    let (_alias, demangled) = rest.split_once(' ')?;
    let demangled = demangled.strip_prefix('(')?.strip_suffix(')')?;

    Some(SymbolRecord {
        ordinal,
        hint,
        address,
        mangled: mangled.to_string(),
        demangled: demangled.trim().to_string(),
    })
}

fn take_field(s: &str) -> Option<(&str, &str)> {
    let s = s.trim_start();
    let end = s.find(char::is_whitespace)?;
    Some((&s[..end], s[end..].trim_start()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DUMP: &str = "\
Dump of file imgui.dll

File Type: DLL

  Section contains the following exports for imgui.dll

    ordinal hint RVA      name

          1    0 0001B2A0 ??0ImColor@@QEAA@H@Z = ??0ImColor@@QEAA@H@Z (public: __cdecl ImColor::ImColor(int))
          2    1 00031F40 ?Begin@ImGui@@YA_NPEBDPEA_NH@Z = ?Begin@ImGui@@YA_NPEBDPEA_NH@Z (bool __cdecl ImGui::Begin(char const *,bool *,int))
          3    2 000F3A10 ?GImGui@@3PEAUImGuiContext@@EA = ?GImGui@@3PEAUImGuiContext@@EA (struct ImGuiContext * GImGui)
          4    3 00012345 igBegin = igBegin

  Summary

        1000 .data
";

    #[test]
    fn test_parse_dump() {
        let records = parse_export_dump(DUMP).unwrap();
        assert_eq!(records.len(), 3);

        assert_eq!(records[0].ordinal, 1);
        assert_eq!(records[0].hint, 0);
        assert_eq!(records[0].address, 0x1B2A0);
        assert_eq!(records[0].mangled, "??0ImColor@@QEAA@H@Z");
        assert_eq!(records[0].demangled, "public: __cdecl ImColor::ImColor(int)");

        assert_eq!(records[1].demangled, "bool __cdecl ImGui::Begin(char const *,bool *,int)");
        assert_eq!(records[2].demangled, "struct ImGuiContext * GImGui");
    }

    #[test]
    fn test_hex_hint() {
        let record = parse_export_line(
            "  171   AA 00012345 ?Foo@@YAXXZ = ?Foo@@YAXXZ (void __cdecl Foo(void))",
        )
        .unwrap();
        assert_eq!(record.ordinal, 171);
        assert_eq!(record.hint, 0xAA);
    }

    #[test]
    fn test_missing_header() {
        assert!(matches!(
            parse_export_dump("no exports here"),
            Err(DemangleError::MissingHeader)
        ));
    }

    #[test]
    fn test_rejects_other_lines() {
        assert!(parse_export_line("").is_none());
        assert!(parse_export_line("1000 .data").is_none());
        assert!(parse_export_line("ordinal hint RVA      name").is_none());
        assert!(parse_export_line("4 3 00012345 igBegin = igBegin").is_none());
    }
}
