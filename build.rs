use std::io::{Result, Write};

// IUPAC nucleotide complement; 0 marks bytes outside the alphabet.
const fn comp_base(base: u8) -> u8 {
    match base {
        b'A' => b'T',
        b'T' => b'A',
        b'C' => b'G',
        b'G' => b'C',
        b'M' => b'K',
        b'K' => b'M',
        b'R' => b'Y',
        b'Y' => b'R',
        b'W' => b'W',
        b'S' => b'S',
        b'B' => b'V',
        b'V' => b'B',
        b'H' => b'D',
        b'D' => b'H',
        b'N' => b'N',
        b'a' => b't',
        b't' => b'a',
        b'c' => b'g',
        b'g' => b'c',
        b'm' => b'k',
        b'k' => b'm',
        b'r' => b'y',
        b'y' => b'r',
        b'w' => b'w',
        b's' => b's',
        b'b' => b'v',
        b'v' => b'b',
        b'h' => b'd',
        b'd' => b'h',
        b'n' => b'n',
        _ => 0,
    }
}

fn main() -> Result<()> {
    let out_dir = std::env::var("OUT_DIR").unwrap();
    let dest_path = std::path::Path::new(&out_dir).join("comp_table.rs");
    let mut f = std::fs::File::create(&dest_path).unwrap();

    write!(f, "const IUPAC_COMP_TABLE: [u8; 256] = [\n")?;
    for b in 0..=255u8 {
        write!(f, "  {},\n", comp_base(b))?;
    }
    write!(f, "];\n")?;

    Ok(())
}
