// https://github.com/rust-lang/cargo/issues/5034
#![warn(clippy::pedantic)]
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::missing_errors_doc,
    clippy::non_ascii_literal,
)]

use anyhow::{bail, Context, Result as AResult};
use mohawk::resources::{bitmap, cursor, midi, palette, quicktime, script, sound, stringlist};
use mohawk::{name, tag, MohawkArchive, Tag};
use pico_args::Arguments;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::process::exit;

fn exit_usage() -> ! {
    eprintln!(
        "Usage: {} <list|dump|hexdump|convert> <file> [resType] [resID] [--palette ID] [--palette-file PATH]",
        std::env::args().next().unwrap_or_else(|| "mohawk".to_string())
    );
    exit(1);
}

struct ConvertOptions {
    palette: Option<u16>,
    palette_file: Option<PathBuf>,
}

fn parse_tag(s: &str) -> AResult<Tag> {
    let bytes = s.as_bytes();
    if bytes.len() != 4 {
        bail!("resource type '{}' is not four characters", s);
    }
    Ok(Tag::new([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

fn list_resources(archive: &MohawkArchive<File>, res_type: Option<Tag>, res_id: Option<u16>) -> AResult<()> {
    let mut types: Vec<Tag> = match res_type {
        Some(t) => vec![t],
        None => archive.types().collect(),
    };
    types.sort();

    for t in types {
        let mut ids = archive.ids(t);
        ids.sort_unstable();

        let ids = if let Some(id) = res_id {
            if ids.contains(&id) {
                vec![id]
            } else {
                bail!("No such resource: {} {}", t, id);
            }
        } else {
            ids
        };

        for id in ids {
            println!("{} {}", t, id);
        }
    }

    Ok(())
}

fn dump_resource(archive: &MohawkArchive<File>, res_type: Tag, res_id: u16) -> AResult<()> {
    let data = archive
        .get(res_type, res_id)
        .with_context(|| format!("failed to get resource {} {}", res_type, res_id))?;
    let file_name = format!("{}_{}.dat", res_type, res_id);
    let mut output =
        File::create(&file_name).with_context(|| format!("failed to open '{}' for writing", file_name))?;
    output.write_all(&data)?;
    Ok(())
}

/// 16 bytes per line, 4-byte grouping with an extra space, ASCII gutter with
/// `.` for non-printable bytes.
fn hexdump_resource(archive: &MohawkArchive<File>, res_type: Tag, res_id: u16) -> AResult<()> {
    let data = archive
        .get(res_type, res_id)
        .with_context(|| format!("failed to get resource {} {}", res_type, res_id))?;

    for (offset, chunk) in data.chunks(16).enumerate() {
        print!("{:08X}: ", offset * 16);

        for x in 0..16 {
            if let Some(b) = chunk.get(x) {
                print!("{:02X} ", b);
            } else {
                print!("   ");
            }
            if x % 4 == 3 {
                print!(" ");
            }
        }

        print!(" |");
        for x in 0..16 {
            match chunk.get(x) {
                Some(&b) if (32..127).contains(&b) => print!("{}", b as char),
                Some(_) => print!("."),
                None => print!(" "),
            }
        }
        println!("|");
    }

    Ok(())
}

fn load_palette(archive: &MohawkArchive<File>, options: &ConvertOptions) -> AResult<Option<palette::Palette>> {
    let Some(id) = options.palette else { return Ok(None) };

    let data = if let Some(path) = &options.palette_file {
        let file = File::open(path).with_context(|| format!("failed to open palette file '{}'", path.display()))?;
        let palette_archive = MohawkArchive::new(file)?;
        palette_archive.get(tag!(b"tPAL"), id)?
    } else {
        archive.get(tag!(b"tPAL"), id)?
    };

    Ok(Some(palette::decode(std::io::Cursor::new(data))?))
}

fn write_png(path: &str, image: &bitmap::DecodedImage) -> AResult<()> {
    let file = File::create(path).with_context(|| format!("failed to open '{}' for writing", path))?;
    let mut encoder = png::Encoder::new(file, u32::from(image.width), u32::from(image.height));

    if image.bits_per_pixel == 8 {
        encoder.set_color(png::ColorType::Indexed);
        encoder.set_depth(png::BitDepth::Eight);
        if let Some(palette) = &image.palette {
            let flat: Vec<u8> = palette.iter().flat_map(|c| c.iter().copied()).collect();
            encoder.set_palette(flat);
        }
    } else {
        encoder.set_color(png::ColorType::Rgb);
        encoder.set_depth(png::BitDepth::Eight);
    }
    encoder.set_compression(png::Compression::Best);

    let mut writer = encoder.write_header()?;
    writer.write_image_data(&image.pixels)?;
    Ok(())
}

fn convert_resource(archive: &MohawkArchive<File>, res_type: Tag, res_id: u16, options: &ConvertOptions) -> AResult<()> {
    let data = archive
        .get(res_type, res_id)
        .with_context(|| format!("failed to get resource {} {}", res_type, res_id))?;

    if res_type == tag!(b"tBMP") {
        let external_palette = load_palette(archive, options)?;
        if bitmap::is_set(&data) {
            let images = bitmap::decode_set(&data, res_type, res_id, external_palette.as_ref())?;
            for (sub_index, image) in images.iter().enumerate() {
                write_png(&format!("{}_{}_{}.png", res_type, res_id, sub_index), image)?;
            }
        } else {
            let image = bitmap::decode(&data, res_type, res_id, external_palette.as_ref())?;
            write_png(&format!("{}_{}.png", res_type, res_id), &image)?;
        }
    } else if res_type == tag!(b"PICT") || res_type == tag!(b"WDIB") {
        let raw = mohawk::compression::lz::unpack(std::io::Cursor::new(&data))?;
        File::create(format!("{}_{}.bmp", res_type, res_id))?.write_all(&raw)?;
    } else if res_type == tag!(b"MSND") {
        let converted = sound::convert_myst_sound(&data, res_type, res_id)?;
        write_converted_sound(res_type, res_id, converted)?;
    } else if res_type == tag!(b"tWAV") {
        let converted = sound::convert_mohawk_wave(&data, res_type, res_id)?;
        write_converted_sound(res_type, res_id, converted)?;
    } else if res_type == tag!(b"tMID") {
        let smf = midi::convert(std::io::Cursor::new(&data))?;
        File::create(format!("{}_{}.mid", res_type, res_id))?.write_all(&smf)?;
    } else if res_type == tag!(b"tMOV") {
        let offset = archive.offset(res_type, res_id)?;
        let rewritten = quicktime::convert(&data, offset)?;
        File::create(format!("{}_{}.mov", res_type, res_id))?.write_all(&rewritten)?;
    } else if res_type == tag!(b"tCUR") {
        let mut output = Vec::new();
        cursor::convert(std::io::Cursor::new(&data), &mut output)?;
        File::create(format!("{}_{}.cur", res_type, res_id))?.write_all(&output)?;
    } else if res_type == tag!(b"NAME") {
        let names = script::parse_name_list(std::io::Cursor::new(data))?;
        let json = names_to_json(&names);
        File::create(format!("{}_{}.json", res_type, res_id))?.write_all(json.as_bytes())?;
    } else if res_type == tag!(b"STRL") {
        let strings = stringlist::decode(std::io::Cursor::new(data))?;
        let json = names_to_json(&strings);
        File::create(format!("{}_{}.json", res_type, res_id))?.write_all(json.as_bytes())?;
    } else if res_type == tag!(b"CARD") {
        let text = script::convert_card(archive, res_id)?;
        File::create(format!("{}_{}.txt", res_type, res_id))?.write_all(text.as_bytes())?;
    } else {
        return Err(mohawk::Error::Unconvertible(res_type).into());
    }

    Ok(())
}

fn write_converted_sound(res_type: Tag, res_id: u16, converted: sound::ConvertedSound) -> AResult<()> {
    match converted {
        sound::ConvertedSound::Wave(bytes) => {
            File::create(format!("{}_{}.wav", res_type, res_id))?.write_all(&bytes)?;
        }
        sound::ConvertedSound::Mpeg(bytes) => {
            File::create(format!("{}_{}.mp3", res_type, res_id))?.write_all(&bytes)?;
        }
    }
    Ok(())
}

fn names_to_json(strings: &[String]) -> String {
    let mut out = String::from("[");
    for (i, s) in strings.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push('"');
        for c in s.chars() {
            match c {
                '"' => out.push_str("\\\""),
                '\\' => out.push_str("\\\\"),
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                c if (c as u32) < 0x20 || (c as u32) > 0x7E => {
                    out.push_str(&format!("\\u{:04x}", c as u32));
                }
                c => out.push(c),
            }
        }
        out.push('"');
    }
    out.push(']');
    out
}

fn run() -> AResult<()> {
    eprintln!("{} resource archive tool", name(true));

    let mut args = Arguments::from_env();
    let palette = args.opt_value_from_str("--palette")?;
    let palette_file = args.opt_value_from_str::<_, PathBuf>("--palette-file")?;
    let options = ConvertOptions { palette, palette_file };

    let free = args.free()?;
    if free.len() < 2 {
        eprintln!("Missing command or file name");
        exit_usage();
    }

    let mode = &free[0];
    let file_name = &free[1];

    let file = File::open(file_name).with_context(|| format!("failed to open '{}'", file_name))?;
    let archive = MohawkArchive::new(file).with_context(|| format!("'{}' is not a valid Mohawk archive", file_name))?;

    match mode.as_str() {
        "list" => {
            let res_type = free.get(2).map(|s| parse_tag(s)).transpose()?;
            let res_id = free.get(3).map(|s| s.parse::<u16>()).transpose()?;
            list_resources(&archive, res_type, res_id)
        }
        "dump" | "hexdump" | "convert" => {
            let res_type = free.get(2).ok_or_else(|| anyhow::anyhow!("Missing resource type"))?;
            let res_type = parse_tag(res_type)?;
            let res_id: u16 = free
                .get(3)
                .ok_or_else(|| anyhow::anyhow!("Missing resource ID"))?
                .parse()
                .context("resource ID must be a number")?;

            match mode.as_str() {
                "dump" => dump_resource(&archive, res_type, res_id),
                "hexdump" => hexdump_resource(&archive, res_type, res_id),
                "convert" => convert_resource(&archive, res_type, res_id, &options),
                _ => unreachable!(),
            }
        }
        other => bail!("Unknown mode: '{}'", other),
    }
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{:#}", err);
        exit(1);
    }
}
