//! Numeric resource type tags and their filename extensions

use std::fmt;

use serde::{Deserialize, Serialize};

/// Engine resource type id (the `u16` stored in KEY, BIF and ERF tables).
///
/// Unknown ids stay representable so archives with modded types still list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceType(pub u16);

impl ResourceType {
    pub const INVALID: Self = Self(0xFFFF);
    pub const BMP: Self = Self(1);
    pub const MVE: Self = Self(2);
    pub const TGA: Self = Self(3);
    pub const WAV: Self = Self(4);
    pub const PLT: Self = Self(6);
    pub const INI: Self = Self(7);
    pub const BMU: Self = Self(8);
    pub const MPG: Self = Self(9);
    pub const TXT: Self = Self(10);
    pub const PLH: Self = Self(2000);
    pub const TEX: Self = Self(2001);
    pub const MDL: Self = Self(2002);
    pub const THG: Self = Self(2003);
    pub const FNT: Self = Self(2005);
    pub const LUA: Self = Self(2007);
    pub const SLT: Self = Self(2008);
    pub const NSS: Self = Self(2009);
    pub const NCS: Self = Self(2010);
    pub const MOD: Self = Self(2011);
    pub const ARE: Self = Self(2012);
    pub const SET: Self = Self(2013);
    pub const IFO: Self = Self(2014);
    pub const BIC: Self = Self(2015);
    pub const WOK: Self = Self(2016);
    pub const TWODA: Self = Self(2017);
    pub const TLK: Self = Self(2018);
    pub const TXI: Self = Self(2022);
    pub const GIT: Self = Self(2023);
    pub const BTI: Self = Self(2024);
    pub const UTI: Self = Self(2025);
    pub const BTC: Self = Self(2026);
    pub const UTC: Self = Self(2027);
    pub const DLG: Self = Self(2029);
    pub const ITP: Self = Self(2030);
    pub const BTT: Self = Self(2031);
    pub const UTT: Self = Self(2032);
    pub const DDS: Self = Self(2033);
    pub const BTS: Self = Self(2034);
    pub const UTS: Self = Self(2035);
    pub const LTR: Self = Self(2036);
    pub const GFF: Self = Self(2037);
    pub const FAC: Self = Self(2038);
    pub const BTE: Self = Self(2039);
    pub const UTE: Self = Self(2040);
    pub const BTD: Self = Self(2041);
    pub const UTD: Self = Self(2042);
    pub const BTP: Self = Self(2043);
    pub const UTP: Self = Self(2044);
    pub const DFT: Self = Self(2045);
    pub const GIC: Self = Self(2046);
    pub const GUI: Self = Self(2047);
    pub const CSS: Self = Self(2048);
    pub const CCS: Self = Self(2049);
    pub const BTM: Self = Self(2050);
    pub const UTM: Self = Self(2051);
    pub const DWK: Self = Self(2052);
    pub const PWK: Self = Self(2053);
    pub const BTG: Self = Self(2054);
    pub const UTG: Self = Self(2055);
    pub const JRL: Self = Self(2056);
    pub const SAV: Self = Self(2057);
    pub const UTW: Self = Self(2058);
    pub const FOURPC: Self = Self(2059);
    pub const SSF: Self = Self(2060);
    pub const HAK: Self = Self(2061);
    pub const NWM: Self = Self(2062);
    pub const BIK: Self = Self(2063);
    pub const NDB: Self = Self(2064);
    pub const PTM: Self = Self(2065);
    pub const PTT: Self = Self(2066);
    pub const ERF: Self = Self(9997);
    pub const BIF: Self = Self(9998);
    pub const KEY: Self = Self(9999);

    #[must_use]
    pub const fn id(self) -> u16 {
        self.0
    }

    /// Lowercase filename extension, if the type is known.
    #[must_use]
    pub fn extension(self) -> Option<&'static str> {
        EXTENSIONS
            .iter()
            .find(|(t, _)| *t == self)
            .map(|(_, ext)| *ext)
    }

    /// Look up a type by extension, ignoring case.
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        EXTENSIONS
            .iter()
            .find(|(_, e)| e.eq_ignore_ascii_case(ext))
            .map(|(t, _)| *t)
    }

    /// Whether resources of this type are GFF documents.
    #[must_use]
    pub fn is_gff(self) -> bool {
        matches!(
            self,
            Self::ARE | Self::IFO | Self::BIC | Self::GIT | Self::UTI | Self::UTC
                | Self::DLG | Self::ITP | Self::UTT | Self::UTS | Self::GFF | Self::FAC
                | Self::UTE | Self::UTD | Self::UTP | Self::GIC | Self::GUI | Self::UTM
                | Self::JRL | Self::UTW | Self::PTM | Self::PTT
        )
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.extension() {
            Some(ext) => f.write_str(ext),
            None => write!(f, "#{}", self.0),
        }
    }
}

impl From<u16> for ResourceType {
    fn from(id: u16) -> Self {
        Self(id)
    }
}

const EXTENSIONS: &[(ResourceType, &str)] = &[
    (ResourceType::BMP, "bmp"),
    (ResourceType::MVE, "mve"),
    (ResourceType::TGA, "tga"),
    (ResourceType::WAV, "wav"),
    (ResourceType::PLT, "plt"),
    (ResourceType::INI, "ini"),
    (ResourceType::BMU, "bmu"),
    (ResourceType::MPG, "mpg"),
    (ResourceType::TXT, "txt"),
    (ResourceType::PLH, "plh"),
    (ResourceType::TEX, "tex"),
    (ResourceType::MDL, "mdl"),
    (ResourceType::THG, "thg"),
    (ResourceType::FNT, "fnt"),
    (ResourceType::LUA, "lua"),
    (ResourceType::SLT, "slt"),
    (ResourceType::NSS, "nss"),
    (ResourceType::NCS, "ncs"),
    (ResourceType::MOD, "mod"),
    (ResourceType::ARE, "are"),
    (ResourceType::SET, "set"),
    (ResourceType::IFO, "ifo"),
    (ResourceType::BIC, "bic"),
    (ResourceType::WOK, "wok"),
    (ResourceType::TWODA, "2da"),
    (ResourceType::TLK, "tlk"),
    (ResourceType::TXI, "txi"),
    (ResourceType::GIT, "git"),
    (ResourceType::BTI, "bti"),
    (ResourceType::UTI, "uti"),
    (ResourceType::BTC, "btc"),
    (ResourceType::UTC, "utc"),
    (ResourceType::DLG, "dlg"),
    (ResourceType::ITP, "itp"),
    (ResourceType::BTT, "btt"),
    (ResourceType::UTT, "utt"),
    (ResourceType::DDS, "dds"),
    (ResourceType::BTS, "bts"),
    (ResourceType::UTS, "uts"),
    (ResourceType::LTR, "ltr"),
    (ResourceType::GFF, "gff"),
    (ResourceType::FAC, "fac"),
    (ResourceType::BTE, "bte"),
    (ResourceType::UTE, "ute"),
    (ResourceType::BTD, "btd"),
    (ResourceType::UTD, "utd"),
    (ResourceType::BTP, "btp"),
    (ResourceType::UTP, "utp"),
    (ResourceType::DFT, "dft"),
    (ResourceType::GIC, "gic"),
    (ResourceType::GUI, "gui"),
    (ResourceType::CSS, "css"),
    (ResourceType::CCS, "ccs"),
    (ResourceType::BTM, "btm"),
    (ResourceType::UTM, "utm"),
    (ResourceType::DWK, "dwk"),
    (ResourceType::PWK, "pwk"),
    (ResourceType::BTG, "btg"),
    (ResourceType::UTG, "utg"),
    (ResourceType::JRL, "jrl"),
    (ResourceType::SAV, "sav"),
    (ResourceType::UTW, "utw"),
    (ResourceType::FOURPC, "4pc"),
    (ResourceType::SSF, "ssf"),
    (ResourceType::HAK, "hak"),
    (ResourceType::NWM, "nwm"),
    (ResourceType::BIK, "bik"),
    (ResourceType::NDB, "ndb"),
    (ResourceType::PTM, "ptm"),
    (ResourceType::PTT, "ptt"),
    (ResourceType::ERF, "erf"),
    (ResourceType::BIF, "bif"),
    (ResourceType::KEY, "key"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_lookup() {
        assert_eq!(ResourceType::UTC.extension(), Some("utc"));
        assert_eq!(ResourceType::TWODA.extension(), Some("2da"));
        assert_eq!(ResourceType::from_extension("2DA"), Some(ResourceType::TWODA));
        assert_eq!(ResourceType::from_extension("Hak"), Some(ResourceType::HAK));
        assert_eq!(ResourceType::from_extension("zzz"), None);
    }

    #[test]
    fn test_unknown_ids_survive() {
        let t = ResourceType::from(4242);
        assert_eq!(t.extension(), None);
        assert_eq!(t.to_string(), "#4242");
    }

    #[test]
    fn test_gff_family() {
        assert!(ResourceType::DLG.is_gff());
        assert!(ResourceType::UTM.is_gff());
        assert!(!ResourceType::TWODA.is_gff());
        assert!(!ResourceType::TLK.is_gff());
    }
}
