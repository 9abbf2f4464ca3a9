//! Riven `NAME`-resource name lists and `tCTL`/`CARD` event-script
//! decompilation into a readable pseudocode dump.

use crate::archive::MohawkArchive;
use crate::error::{Error, Result};
use crate::io::{ByteReadExt, SeekExt};
use crate::string::StringReadExt;
use crate::tag;
use crate::types::reader::Reader;
use std::io::{Read, Seek, SeekFrom};

/// Every opcode a Riven card script can invoke, keyed by its numeric code.
/// Six of these (7, 8, 17, 24, 27, plus the implicit default branch) get a
/// dedicated pretty-printer in [`decode_commands`]; the rest print as a
/// generic `name(args...)` call.
fn opcode_name(opcode: u16) -> Option<&'static str> {
    Some(match opcode {
        1 => "drawBitmap",
        2 => "changeCard",
        3 => "playScriptSLST",
        4 => "playSound",
        7 => "setVariable",
        8 => "switch",
        9 => "enableHotspot",
        10 => "disableHotspot",
        12 => "stopSound",
        13 => "changeCursor",
        14 => "delay",
        17 => "runExternalCommand",
        18 => "transition",
        19 => "refreshCard",
        20 => "disableScreenUpdate",
        21 => "enableScreenUpdate",
        24 => "incrementVariable",
        27 => "changeStack",
        28 => "disableMovie",
        29 => "disableAllMovies",
        31 => "enableMovie",
        32 => "playMovieBlocking",
        33 => "playMovie",
        34 => "stopMovie",
        36 => "unk36",
        37 => "fadeAmbientSounds",
        38 => "storeMovieOpcode",
        39 => "activatePLST",
        40 => "activateSLST",
        41 => "activateMLSTAndPlay",
        43 => "activateBLST",
        44 => "activateFLST",
        45 => "zipMode",
        46 => "activateMLST",
        _ => return None,
    })
}

fn script_type_name(type_code: u16) -> Option<&'static str> {
    Some(match type_code {
        0 => "Mouse Down",
        2 => "Mouse Up",
        4 => "Mouse Inside",
        6 => "Card Load",
        7 => "Card Leave",
        9 => "Card Open",
        10 => "Card Update",
        _ => return None,
    })
}

/// Parses a Riven `NAME` resource: a table of string offsets followed by an
/// equal-sized table of unknown purpose, then the C-strings themselves.
/// Each string has any leading or trailing `0xBD` bytes stripped (mirroring
/// Python's `str.strip`, which only trims the ends, not interior
/// occurrences); their meaning isn't documented anywhere in the original
/// tool either.
pub fn parse_name_list<R: Read + Seek>(mut input: R) -> Result<Vec<String>> {
    let name_count = input.read_u16_be()?;
    let mut offsets = Vec::with_capacity(name_count as usize);
    for _ in 0..name_count {
        offsets.push(input.read_u16_be()?);
    }

    let mut strings = Vec::with_capacity(name_count as usize);
    for offset in offsets {
        let pos = u64::from(offset) + u64::from(name_count) * 4 + 2;
        input.seek(SeekFrom::Start(pos))?;
        let raw = input.read_c_string()?;
        let mut trimmed = raw.as_slice();
        while trimmed.first() == Some(&0xBD) {
            trimmed = &trimmed[1..];
        }
        while trimmed.last() == Some(&0xBD) {
            trimmed = &trimmed[..trimmed.len() - 1];
        }
        strings.push(String::from_utf8_lossy(trimmed).into_owned());
    }

    Ok(strings)
}

fn indent(tabs: usize) -> String {
    "\t".repeat(tabs)
}

/// Decodes one command block (a `commandCount`-prefixed run of opcodes) to
/// text, recursing into nested blocks for `switch` case bodies.
fn decode_commands<R: Read>(
    input: &mut R,
    external_command_names: &[String],
    variable_names: &[String],
    stack_names: &[String],
    tabs: usize,
) -> Result<String> {
    let mut text = String::new();
    let command_count = input.read_u16_be()?;

    for _ in 0..command_count {
        let command = input.read_u16_be()?;
        let var_count = input.read_u16_be()?;
        text.push_str(&indent(tabs));

        match command {
            7 => {
                let var_index = input.read_u16_be()?;
                let immediate_value = input.read_u16_be()?;
                text.push_str(&format!(
                    "{} = {};\n",
                    name_or_index(variable_names, var_index),
                    immediate_value
                ));
            }
            8 => {
                let var_index = input.read_u16_be()?;
                let case_count = input.read_u16_be()?;
                text.push_str(&format!("switch ({}) {{\n", name_or_index(variable_names, var_index)));

                for _ in 0..case_count {
                    text.push_str(&indent(tabs));
                    let case_immediate = input.read_u16_be()?;
                    if case_immediate == 0xFFFF {
                        text.push_str("default:\n");
                    } else {
                        text.push_str(&format!("case {}:\n", case_immediate));
                    }

                    text.push_str(&decode_commands(
                        input,
                        external_command_names,
                        variable_names,
                        stack_names,
                        tabs + 1,
                    )?);
                    text.push_str(&indent(tabs + 1));
                    text.push_str("break;\n");
                }

                text.push_str(&indent(tabs));
                text.push_str("}\n");
            }
            17 => {
                let name_index = input.read_u16_be()?;
                let ex_var_count = input.read_u16_be()?;
                let mut variables = Vec::with_capacity(ex_var_count as usize);
                for _ in 0..ex_var_count {
                    variables.push(input.read_u16_be()?.to_string());
                }
                text.push_str(&format!(
                    "{}({});\n",
                    name_or_index(external_command_names, name_index),
                    variables.join(", ")
                ));
            }
            24 => {
                let var_index = input.read_u16_be()?;
                let immediate_value = input.read_u16_be()?;
                text.push_str(&format!(
                    "{} += {};\n",
                    name_or_index(variable_names, var_index),
                    immediate_value
                ));
            }
            27 => {
                let stack_index = input.read_u16_be()?;
                let rmap_code = input.read_u32_be()?;
                text.push_str(&format!(
                    "changeStack({}, {});\n",
                    name_or_index(stack_names, stack_index),
                    rmap_code
                ));
            }
            other => {
                let mut variables = Vec::with_capacity(var_count as usize);
                for _ in 0..var_count {
                    variables.push(input.read_u16_be()?.to_string());
                }
                let name = opcode_name(other).ok_or(Error::UnknownRivenOpcode(other))?;
                text.push_str(&format!("{}({});\n", name, variables.join(", ")));
            }
        }
    }

    Ok(text)
}

fn name_or_index(names: &[String], index: u16) -> String {
    names.get(index as usize).cloned().unwrap_or_else(|| format!("var{}", index))
}

/// Decodes a whole event script: one `scriptTypeNames`-tagged command block
/// per recognized event (mouse down, card load, and so on).
fn decode_script<R: Read>(
    input: &mut R,
    external_command_names: &[String],
    variable_names: &[String],
    stack_names: &[String],
) -> Result<String> {
    let mut text = String::new();
    let script_count = input.read_u16_be()?;

    for _ in 0..script_count {
        if !text.is_empty() {
            text.push('\n');
        }

        let type_code = input.read_u16_be()?;
        let type_name = script_type_name(type_code).ok_or(Error::UnknownRivenScriptType(type_code))?;
        text.push_str(&format!("{} Script:\n", type_name));
        text.push_str(&decode_commands(input, external_command_names, variable_names, stack_names, 1)?);
    }

    Ok(text)
}

/// Decompiles a Riven `CARD` resource into a text header (card name, zip
/// mode flag) followed by its decoded event scripts, using the archive's
/// `NAME` resources 1/3/4/5 (card, external command, variable, and stack
/// names respectively) to resolve the numeric indices scripts refer to.
pub fn convert_card<T: Reader>(archive: &MohawkArchive<T>, id: u16) -> Result<String> {
    let card_names = parse_name_list(std::io::Cursor::new(archive.get(tag!(b"NAME"), 1)?))?;
    let external_command_names = parse_name_list(std::io::Cursor::new(archive.get(tag!(b"NAME"), 3)?))?;
    let variable_names = parse_name_list(std::io::Cursor::new(archive.get(tag!(b"NAME"), 4)?))?;
    let stack_names = parse_name_list(std::io::Cursor::new(archive.get(tag!(b"NAME"), 5)?))?;

    let data = archive.get(tag!(b"CARD"), id)?;
    let mut input = std::io::Cursor::new(data);

    let name_id = input.read_u16_be()?;
    let is_zip_mode_dest = input.read_u16_be()?;

    let name_text = if name_id == 0xFFFF {
        "<No Card Name>".to_string()
    } else {
        card_names.get(name_id as usize).cloned().unwrap_or_else(|| "<No Card Name>".to_string())
    };

    let mut text = format!(
        "Card Name: {}\nIs Zip Mode Destination? {}\n\n",
        name_text,
        if is_zip_mode_dest != 0 { "Yes" } else { "No" }
    );
    text.push_str(&decode_script(&mut input, &external_command_names, &variable_names, &stack_names)?);

    Ok(text)
}
