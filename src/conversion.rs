mod bank_holidays;
mod calendar;
mod converter;

pub use converter::{
    ConversionOptions, ConversionResult, ConversionStats, ConversionWarning, Region,
    TxcToGtfsConverter, WarningKind,
};
