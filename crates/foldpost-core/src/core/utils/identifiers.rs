use phf::{Map, Set, phf_map, phf_set};

static BACKBONE_ATOM_NAMES: Set<&'static str> = phf_set! {
    "N", "H", "HN", "CA", "HA", "C", "O", "OXT", "H1", "H2", "H3",
    "HA2", "HA3", "1HA", "2HA",
};

static ONE_LETTER_CODES: Map<&'static str, char> = phf_map! {
    "ALA" => 'A', "ARG" => 'R', "ASN" => 'N', "ASP" => 'D', "CYS" => 'C',
    "GLN" => 'Q', "GLU" => 'E', "GLY" => 'G', "HIS" => 'H', "ILE" => 'I',
    "LEU" => 'L', "LYS" => 'K', "MET" => 'M', "PHE" => 'F', "PRO" => 'P',
    "SER" => 'S', "THR" => 'T', "TRP" => 'W', "TYR" => 'Y', "VAL" => 'V',
};

pub fn is_backbone_atom(atom_name: &str) -> bool {
    BACKBONE_ATOM_NAMES.contains(atom_name.trim())
}

pub fn is_heavy_atom(atom_name: &str) -> bool {
    let first_char = atom_name
        .trim()
        .trim_start_matches(|c: char| c.is_ascii_digit())
        .chars()
        .next()
        .map(|c| c.to_ascii_uppercase());
    !matches!(first_char, Some('H') | Some('D'))
}

pub fn is_standard_amino_acid(residue_name: &str) -> bool {
    ONE_LETTER_CODES.contains_key(residue_name.trim())
}

pub fn one_letter_code(residue_name: &str) -> Option<char> {
    ONE_LETTER_CODES.get(residue_name.trim()).copied()
}
