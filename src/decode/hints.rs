//! Linear decoder hints.

use serde::{Deserialize, Serialize};

/// One-dimensional barcode symbologies a linear decoder may accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Symbology {
    /// Code 128.
    Code128,
    /// Code 39.
    Code39,
    /// Code 93.
    Code93,
    /// Codabar.
    Codabar,
    /// EAN-8.
    Ean8,
    /// EAN-13.
    Ean13,
    /// Interleaved 2 of 5.
    Itf,
    /// UPC-A.
    UpcA,
    /// UPC-E.
    UpcE,
}

/// Decoding hints handed to the linear decoder with every dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinearHints {
    /// Symbologies to accept. Anything else is ignored by the decoder.
    pub possible_formats: Vec<Symbology>,
    /// Spend more time looking for a symbol.
    pub try_harder: bool,
    /// Expect the symbol in landscape orientation.
    pub assume_landscape: bool,
    /// Expect a pure symbol with no surrounding border.
    pub pure_barcode: bool,
}

impl Default for LinearHints {
    fn default() -> Self {
        Self {
            possible_formats: vec![Symbology::Code128],
            try_harder: true,
            assume_landscape: true,
            pure_barcode: true,
        }
    }
}

impl LinearHints {
    /// Creates hints that accept a single symbology.
    pub fn only(symbology: Symbology) -> Self {
        Self {
            possible_formats: vec![symbology],
            ..Self::default()
        }
    }

    /// Returns true if the given symbology is accepted.
    pub fn accepts(&self, symbology: Symbology) -> bool {
        self.possible_formats.contains(&symbology)
    }
}
