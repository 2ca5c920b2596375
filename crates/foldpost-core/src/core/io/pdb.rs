use crate::core::io::traits::StructureFile;
use crate::core::models::atom::{Atom, AtomRole};
use crate::core::models::structure::{Structure, StructureBuilder};
use nalgebra::Point3;
use phf::{Map, phf_map};
use std::io::{self, BufRead, Write};
use thiserror::Error;

/// Chemical component codes of modified residues, as (base residue, patch).
static MODIFIED_RESIDUES: Map<&'static str, (&'static str, &'static str)> = phf_map! {
    "SEP" => ("SER", "phosphorylated"),
    "TPO" => ("THR", "phosphorylated"),
    "PTR" => ("TYR", "phosphorylated"),
    "ALY" => ("LYS", "acetylated"),
    "MLZ" => ("LYS", "monomethylated"),
    "MLY" => ("LYS", "dimethylated"),
    "M3L" => ("LYS", "trimethylated"),
};

/// Reverse of [`MODIFIED_RESIDUES`], keyed by variant name.
static COMPONENT_CODES: Map<&'static str, &'static str> = phf_map! {
    "SER:phosphorylated" => "SEP",
    "THR:phosphorylated" => "TPO",
    "TYR:phosphorylated" => "PTR",
    "LYS:acetylated" => "ALY",
    "LYS:monomethylated" => "MLZ",
    "LYS:dimethylated" => "MLY",
    "LYS:trimethylated" => "M3L",
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PdbMetadata {
    /// Records preceding the first coordinate record (HEADER, REMARK, ...).
    pub header_lines: Vec<String>,
}

#[derive(Debug, Error)]
pub enum PdbError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse { line: usize, kind: PdbParseErrorKind },
    #[error("No ATOM or HETATM records found")]
    Empty,
}

#[derive(Debug, Error)]
pub enum PdbParseErrorKind {
    #[error("Invalid integer format in columns {columns} (value: '{value}')")]
    InvalidInt { columns: &'static str, value: String },
    #[error("Invalid float format in columns {columns} (value: '{value}')")]
    InvalidFloat { columns: &'static str, value: String },
    #[error("Required field in columns {columns} is empty")]
    MissingRequiredField { columns: &'static str },
    #[error("Line is too short for a coordinate record (must be at least 54 chars)")]
    LineTooShort,
}

fn slice_and_trim(line: &str, start: usize, end: usize) -> &str {
    line.get(start..end.min(line.len())).unwrap_or("").trim()
}

fn parse_float(line: &str, start: usize, end: usize, columns: &'static str, line_num: usize) -> Result<f64, PdbError> {
    let value = slice_and_trim(line, start, end);
    value.parse().map_err(|_| PdbError::Parse {
        line: line_num,
        kind: PdbParseErrorKind::InvalidFloat {
            columns,
            value: value.into(),
        },
    })
}

/// Residue identity as it appears on a coordinate record.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ResidueKey {
    chain_id: char,
    number: isize,
    insertion_code: Option<char>,
    name: String,
}

/// Fixed-column Protein Data Bank format. Only the first model is read.
pub struct PdbFile;

impl StructureFile for PdbFile {
    type Metadata = PdbMetadata;
    type Error = PdbError;

    fn read_from(reader: &mut impl BufRead) -> Result<(Structure, Self::Metadata), Self::Error> {
        let mut builder = StructureBuilder::new();
        let mut metadata = PdbMetadata::default();
        let mut current: Option<ResidueKey> = None;
        let mut chain_terminated = false;
        let mut atom_count = 0usize;

        for (line_num, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let line_num = line_num + 1;
            let record_type = slice_and_trim(&line, 0, 6);

            match record_type {
                "ATOM" | "HETATM" => {
                    if line.len() < 54 {
                        return Err(PdbError::Parse {
                            line: line_num,
                            kind: PdbParseErrorKind::LineTooShort,
                        });
                    }
                    let alt_loc = line.get(16..17).unwrap_or(" ");
                    if alt_loc != " " && alt_loc != "A" {
                        continue;
                    }

                    let serial_str = slice_and_trim(&line, 6, 11);
                    let serial: usize = serial_str.parse().map_err(|_| PdbError::Parse {
                        line: line_num,
                        kind: PdbParseErrorKind::InvalidInt {
                            columns: "7-11",
                            value: serial_str.into(),
                        },
                    })?;
                    let name = slice_and_trim(&line, 12, 16);
                    if name.is_empty() {
                        return Err(PdbError::Parse {
                            line: line_num,
                            kind: PdbParseErrorKind::MissingRequiredField { columns: "13-16" },
                        });
                    }
                    let res_name = slice_and_trim(&line, 17, 20);
                    let chain_id = line.get(21..22).and_then(|s| s.chars().next()).unwrap_or(' ');
                    let chain_id = if chain_id == ' ' { 'A' } else { chain_id };
                    let number_str = slice_and_trim(&line, 22, 26);
                    let number: isize = number_str.parse().map_err(|_| PdbError::Parse {
                        line: line_num,
                        kind: PdbParseErrorKind::InvalidInt {
                            columns: "23-26",
                            value: number_str.into(),
                        },
                    })?;
                    let insertion_code = line
                        .get(26..27)
                        .and_then(|s| s.chars().next())
                        .filter(|c| *c != ' ');
                    let x = parse_float(&line, 30, 38, "31-38", line_num)?;
                    let y = parse_float(&line, 38, 46, "39-46", line_num)?;
                    let z = parse_float(&line, 46, 54, "47-54", line_num)?;
                    let occupancy = if line.len() >= 60 {
                        parse_float(&line, 54, 60, "55-60", line_num).unwrap_or(1.0)
                    } else {
                        1.0
                    };
                    let b_factor = if line.len() >= 66 {
                        parse_float(&line, 60, 66, "61-66", line_num).unwrap_or(0.0)
                    } else {
                        0.0
                    };
                    let element = slice_and_trim(&line, 76, 78);

                    let key = ResidueKey {
                        chain_id,
                        number,
                        insertion_code,
                        name: res_name.to_string(),
                    };
                    let new_chain = chain_terminated
                        || current.as_ref().is_none_or(|c| c.chain_id != chain_id);
                    if new_chain {
                        builder.start_chain(chain_id);
                        chain_terminated = false;
                    }
                    if new_chain || current.as_ref() != Some(&key) {
                        match MODIFIED_RESIDUES.get(res_name) {
                            Some((base, patch)) => {
                                builder.start_residue(base, number, insertion_code);
                                builder.add_patch(patch);
                            }
                            None => builder.start_residue(res_name, number, insertion_code),
                        }
                        current = Some(key);
                    }

                    let mut atom = Atom::new(serial, name, Point3::new(x, y, z)).with_element(element);
                    atom.occupancy = occupancy;
                    atom.b_factor = b_factor;
                    if record_type == "HETATM" && !MODIFIED_RESIDUES.contains_key(res_name) {
                        atom.role = AtomRole::Other;
                    }
                    builder.add_atom(atom);
                    atom_count += 1;
                }
                "TER" => chain_terminated = true,
                "ENDMDL" | "END" => break,
                "MODEL" | "ANISOU" | "CONECT" | "MASTER" => {}
                _ => {
                    if atom_count == 0 && !line.trim().is_empty() {
                        metadata.header_lines.push(line.clone());
                    }
                }
            }
        }

        if atom_count == 0 {
            return Err(PdbError::Empty);
        }
        Ok((builder.build(), metadata))
    }

    fn write_to(
        structure: &Structure,
        metadata: &Self::Metadata,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error> {
        for line in &metadata.header_lines {
            writeln!(writer, "{}", line)?;
        }

        let mut serial = 0usize;
        for chain in structure.chains() {
            let mut last_name = String::new();
            let mut last_number = 0isize;
            for index in chain.begin()..=chain.end() {
                let Some(residue) = structure.residue(index) else {
                    continue;
                };
                let variant = residue.variant_name();
                let (res_name, record) = match COMPONENT_CODES.get(variant.as_str()) {
                    Some(code) => (*code, "HETATM"),
                    None => (residue.name.as_str(), "ATOM"),
                };
                for atom in residue.atoms() {
                    serial += 1;
                    let record = if atom.role == AtomRole::Other { "HETATM" } else { record };
                    writeln!(
                        writer,
                        "{:<6}{:>5} {}{}{:>3} {}{:>4}{}   {:>8.3}{:>8.3}{:>8.3}{:>6.2}{:>6.2}          {:>2}",
                        record,
                        serial % 100_000,
                        format_atom_name(&atom.name),
                        ' ',
                        res_name,
                        chain.id,
                        residue.number,
                        residue.insertion_code.unwrap_or(' '),
                        atom.position.x,
                        atom.position.y,
                        atom.position.z,
                        atom.occupancy,
                        atom.b_factor,
                        atom.element_symbol(),
                    )?;
                }
                last_name = res_name.to_string();
                last_number = residue.number;
            }
            if !chain.is_empty() {
                serial += 1;
                writeln!(
                    writer,
                    "{:<6}{:>5}      {:>3} {}{:>4}",
                    "TER", serial % 100_000, last_name, chain.id, last_number
                )?;
            }
        }
        writeln!(writer, "END")?;
        Ok(())
    }
}

/// Aligns an atom name to columns 13-16: names shorter than four characters start
/// in column 14.
fn format_atom_name(name: &str) -> String {
    if name.len() >= 4 {
        name[..4].to_string()
    } else {
        format!(" {:<3}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::two_chain_structure;
    use std::io::Cursor;

    const SAMPLE: &str = "\
REMARK   1 PREDICTED MODEL
ATOM      1  N   SER A  45      -1.200   0.600   0.000  1.00 91.20           N
ATOM      2  CA  SER A  45       0.000   0.000   0.000  1.00 91.20           C
ATOM      3  CB  SER A  45       0.000  -1.500   0.000  1.00 91.20           C
ATOM      4  CA  LYS A  46       3.800   0.000   0.000  1.00 85.00           C
TER       5      LYS A  46
ATOM      6  CA  GLY B   1       0.000  -5.500   0.000  1.00 70.10           C
END
";

    #[test]
    fn read_parses_chains_residues_and_confidence() {
        let (structure, metadata) = PdbFile::read_from(&mut Cursor::new(SAMPLE)).unwrap();
        assert_eq!(metadata.header_lines.len(), 1);
        assert_eq!(structure.total_residue(), 3);
        assert_eq!(structure.num_chains(), 2);
        assert_eq!(structure.residue(1).unwrap().name, "SER");
        assert_eq!(structure.residue(1).unwrap().number, 45);
        assert_eq!(structure.residue(1).unwrap().atoms().len(), 3);
        assert_eq!(structure.confidence(1), Some(91.2));
        assert_eq!(structure.confidence(3), Some(70.1));
        assert_eq!(structure.chain_id_of(3), Some('B'));
    }

    #[test]
    fn read_fails_on_bad_coordinate() {
        let bad = "ATOM      1  CA  SER A  45       x.000   0.000   0.000  1.00 91.20           C\n";
        let err = PdbFile::read_from(&mut Cursor::new(bad)).unwrap_err();
        assert!(matches!(
            err,
            PdbError::Parse {
                line: 1,
                kind: PdbParseErrorKind::InvalidFloat { .. }
            }
        ));
    }

    #[test]
    fn read_fails_without_coordinates() {
        let err = PdbFile::read_from(&mut Cursor::new("REMARK nothing here\nEND\n")).unwrap_err();
        assert!(matches!(err, PdbError::Empty));
    }

    #[test]
    fn read_keeps_only_first_alternate_location() {
        let text = "\
ATOM      1  CA ASER A   1       0.000   0.000   0.000  0.50 10.00           C
ATOM      2  CA BSER A   1       1.000   0.000   0.000  0.50 20.00           C
";
        let (structure, _) = PdbFile::read_from(&mut Cursor::new(text)).unwrap();
        assert_eq!(structure.residue(1).unwrap().atoms().len(), 1);
        assert_eq!(structure.confidence(1), Some(10.0));
    }

    #[test]
    fn write_then_read_preserves_structure() {
        let structure = two_chain_structure(3, 2);
        let mut buffer = Vec::new();
        PdbFile::write_to(&structure, &PdbMetadata::default(), &mut buffer).unwrap();
        let (reread, _) = PdbFile::read_from(&mut Cursor::new(buffer)).unwrap();

        assert_eq!(reread.total_residue(), structure.total_residue());
        assert_eq!(reread.num_chains(), 2);
        for index in 1..=structure.total_residue() {
            assert_eq!(reread.confidence(index), structure.confidence(index));
            assert_eq!(
                reread.residue(index).unwrap().atoms().len(),
                structure.residue(index).unwrap().atoms().len()
            );
        }
    }

    #[test]
    fn modified_residues_are_written_as_component_codes() {
        let mut structure = two_chain_structure(2, 1);
        structure.residue_mut(1).unwrap().patches.push("phosphorylated".into());
        let mut buffer = Vec::new();
        PdbFile::write_to(&structure, &PdbMetadata::default(), &mut buffer).unwrap();
        let text = String::from_utf8(buffer.clone()).unwrap();
        assert!(text.contains("HETATM"));
        assert!(text.contains("SEP A"));

        let (reread, _) = PdbFile::read_from(&mut Cursor::new(buffer)).unwrap();
        let residue = reread.residue(1).unwrap();
        assert_eq!(residue.name, "SER");
        assert!(residue.has_patch("phosphorylated"));
    }

    #[test]
    fn format_atom_name_aligns_short_names() {
        assert_eq!(format_atom_name("CA"), " CA ");
        assert_eq!(format_atom_name("HD21"), "HD21");
    }
}
