use phf::phf_map;

pub const STOP_CHAR: u8 = b'*';
const UNKNOWN_AA_CHAR: u8 = b'X';

static CODON_TABLE: phf::Map<&[u8; 3], u8> = phf_map! {
        b"TTT" => b'F',
        b"TTC" => b'F',
        b"TTA" => b'L',
        b"TTG" => b'L',
        b"CTT" => b'L',
        b"CTC" => b'L',
        b"CTA" => b'L',
        b"CTG" => b'L',
        b"ATT" => b'I',
        b"ATC" => b'I',
        b"ATA" => b'I',
        b"ATG" => b'M',
        b"GTT" => b'V',
        b"GTC" => b'V',
        b"GTA" => b'V',
        b"GTG" => b'V',
        b"TCT" => b'S',
        b"TCC" => b'S',
        b"TCA" => b'S',
        b"TCG" => b'S',
        b"CCT" => b'P',
        b"CCC" => b'P',
        b"CCA" => b'P',
        b"CCG" => b'P',
        b"ACT" => b'T',
        b"ACC" => b'T',
        b"ACA" => b'T',
        b"ACG" => b'T',
        b"GCT" => b'A',
        b"GCC" => b'A',
        b"GCA" => b'A',
        b"GCG" => b'A',
        b"TAT" => b'Y',
        b"TAC" => b'Y',
        b"CAT" => b'H',
        b"CAC" => b'H',
        b"CAA" => b'Q',
        b"CAG" => b'Q',
        b"AAT" => b'N',
        b"AAC" => b'N',
        b"AAA" => b'K',
        b"AAG" => b'K',
        b"GAT" => b'D',
        b"GAC" => b'D',
        b"GAA" => b'E',
        b"GAG" => b'E',
        b"TGT" => b'C',
        b"TGC" => b'C',
        b"TGG" => b'W',
        b"CGT" => b'R',
        b"CGC" => b'R',
        b"CGA" => b'R',
        b"CGG" => b'R',
        b"AGT" => b'S',
        b"AGC" => b'S',
        b"AGA" => b'R',
        b"AGG" => b'R',
        b"GGT" => b'G',
        b"GGC" => b'G',
        b"GGA" => b'G',
        b"GGG" => b'G',
        b"TAA" => b'*',
        b"TAG" => b'*',
        b"TGA" => b'*',
};

/// Translates a coding sequence with the standard genetic code, starting at
/// 1-based `codon_start` (the GenBank `/codon_start` qualifier). A trailing
/// partial codon is dropped and codons with ambiguous bases become `X`.
pub fn translate_cds(dna_seq: &[u8], codon_start: usize) -> Vec<u8> {
    let offset = codon_start.saturating_sub(1).min(dna_seq.len());
    let coding = dna_seq[offset..].to_ascii_uppercase();

    let mut amino_acids: Vec<u8> = coding
        .chunks_exact(3)
        .map(|codon| {
            let triplet: [u8; 3] = [codon[0], codon[1], codon[2]];
            CODON_TABLE.get(&triplet).copied().unwrap_or(UNKNOWN_AA_CHAR)
        })
        .collect();

    if amino_acids.last() == Some(&STOP_CHAR) {
        amino_acids.pop();
    }
    amino_acids
}
