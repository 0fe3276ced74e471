//! Lifecycle states for transactions and top-up requests.
//!
//! The wire and database representation is the Indonesian label shown on the
//! cashier screen, so the enums rename accordingly.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionStatus {
    #[serde(rename = "Diproses")]
    Diproses,
    #[serde(rename = "Selesai")]
    Selesai,
    #[serde(rename = "Selesai Dibayar")]
    SelesaiDibayar,
    #[serde(rename = "Belum Dibayar")]
    BelumDibayar,
    #[serde(rename = "Dibatalkan")]
    Dibatalkan,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Diproses => "Diproses",
            TransactionStatus::Selesai => "Selesai",
            TransactionStatus::SelesaiDibayar => "Selesai Dibayar",
            TransactionStatus::BelumDibayar => "Belum Dibayar",
            TransactionStatus::Dibatalkan => "Dibatalkan",
        }
    }

    /// `Dibatalkan` is terminal; every other state may still be cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, TransactionStatus::Dibatalkan)
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Diproses" => Ok(TransactionStatus::Diproses),
            "Selesai" => Ok(TransactionStatus::Selesai),
            "Selesai Dibayar" => Ok(TransactionStatus::SelesaiDibayar),
            "Belum Dibayar" => Ok(TransactionStatus::BelumDibayar),
            "Dibatalkan" => Ok(TransactionStatus::Dibatalkan),
            other => Err(format!("unknown transaction status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TopUpStatus {
    #[serde(rename = "Menunggu")]
    Menunggu,
    #[serde(rename = "Disetujui")]
    Disetujui,
    #[serde(rename = "Ditolak")]
    Ditolak,
}

impl TopUpStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TopUpStatus::Menunggu => "Menunggu",
            TopUpStatus::Disetujui => "Disetujui",
            TopUpStatus::Ditolak => "Ditolak",
        }
    }
}

impl fmt::Display for TopUpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TopUpStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Menunggu" => Ok(TopUpStatus::Menunggu),
            "Disetujui" => Ok(TopUpStatus::Disetujui),
            "Ditolak" => Ok(TopUpStatus::Ditolak),
            other => Err(format!("unknown top up status: {}", other)),
        }
    }
}
