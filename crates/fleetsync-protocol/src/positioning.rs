//! Proprietary `$PK` positioning sentences.
//!
//! Radios report GNSS fixes as NMEA-style sentences with a vendor prefix and
//! the sender's fleet/device appended:
//!
//! ```text
//! $PKLSH,3851.3330,N,09447.9417,W,012212,V,100,1202,*24
//!        |         | |          | |      | |   |
//!        lat      N/S lon      E/W time  | fleet device
//!                                        status
//! ```
//!
//! Decoding is behind the [`PositioningDecoder`] trait so callers can plug in
//! a full NMEA library. [`PkSentenceDecoder`] handles the FleetSync sentences.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::PositioningError;

/// Turns a `$PK…` sentence into a [`PositionReport`].
pub trait PositioningDecoder: Send + Sync {
    /// Decode one sentence, without line terminator.
    fn decode(&self, sentence: &str) -> Result<PositionReport, PositioningError>;
}

/// GNSS fix status carried by a sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FixStatus {
    /// 'A': the receiver had a valid fix.
    Valid,
    /// 'V': position is stale or estimated.
    Invalid,
}

/// Position and sender identity decoded from a proprietary sentence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionReport {
    /// Sentence identifier without the `$`, e.g. `PKLSH`.
    pub sentence: String,
    /// Latitude in decimal degrees, negative south.
    pub latitude: f64,
    /// Longitude in decimal degrees, negative west.
    pub longitude: f64,
    /// UTC time of the fix.
    pub time: Option<NaiveTime>,
    /// UTC date of the fix, for sentences that carry one.
    pub date: Option<NaiveDate>,
    /// Fix status.
    pub status: FixStatus,
    /// Speed over ground in knots.
    pub speed_knots: Option<f64>,
    /// Course over ground in degrees true.
    pub course: Option<f64>,
    /// Sender's fleet.
    pub fleet_id: u16,
    /// Sender's device.
    pub device_id: u16,
}

/// Decoder for the FleetSync `PKLSH` and `PKLDS` sentences.
///
/// A `*hh` checksum, when present, must match.
#[derive(Debug, Default, Clone, Copy)]
pub struct PkSentenceDecoder;

impl PositioningDecoder for PkSentenceDecoder {
    fn decode(&self, sentence: &str) -> Result<PositionReport, PositioningError> {
        let payload = verify_checksum(sentence)?;
        let fields: Vec<&str> = payload.split(',').collect();
        let id = fields[0];
        let fields = Fields(&fields[1..]);

        match id {
            // lat,NS,lon,EW,time,status,fleet,device
            "PKLSH" => Ok(PositionReport {
                sentence: id.to_string(),
                latitude: fields.coordinate(0, 1, "latitude")?,
                longitude: fields.coordinate(2, 3, "longitude")?,
                time: Some(fields.time(4)?),
                date: None,
                status: fields.status(5)?,
                speed_knots: None,
                course: None,
                fleet_id: fields.id(6, "fleet")?,
                device_id: fields.id(7, "device")?,
            }),

            // time,status,lat,NS,lon,EW,speed,course,date,decl,decl_dir,fleet,device,...
            "PKLDS" => Ok(PositionReport {
                sentence: id.to_string(),
                time: Some(fields.time(0)?),
                status: fields.status(1)?,
                latitude: fields.coordinate(2, 3, "latitude")?,
                longitude: fields.coordinate(4, 5, "longitude")?,
                speed_knots: fields.optional_number(6, "speed")?,
                course: fields.optional_number(7, "course")?,
                date: Some(fields.date(8)?),
                fleet_id: fields.id(11, "fleet")?,
                device_id: fields.id(12, "device")?,
            }),

            _ => Err(PositioningError::UnsupportedSentence(id.to_string())),
        }
    }
}

/// Strip `$` and an optional `*hh` suffix, checking the XOR checksum.
fn verify_checksum(sentence: &str) -> Result<&str, PositioningError> {
    let body = sentence.strip_prefix('$').unwrap_or(sentence);
    let Some((payload, checksum)) = body.split_once('*') else {
        return Ok(body);
    };

    let expected = u8::from_str_radix(checksum.trim(), 16).map_err(|_| {
        PositioningError::InvalidField {
            field: "checksum",
            value: checksum.to_string(),
        }
    })?;
    let actual = payload.bytes().fold(0u8, |acc, b| acc ^ b);
    if expected != actual {
        return Err(PositioningError::ChecksumMismatch { expected, actual });
    }
    Ok(payload)
}

/// Positional view over the comma-separated fields after the sentence id.
struct Fields<'a>(&'a [&'a str]);

impl<'a> Fields<'a> {
    fn get(&self, index: usize, name: &'static str) -> Result<&'a str, PositioningError> {
        match self.0.get(index).map(|f| f.trim()) {
            Some(field) if !field.is_empty() => Ok(field),
            _ => Err(PositioningError::MissingField(name)),
        }
    }

    fn invalid(name: &'static str, value: &str) -> PositioningError {
        PositioningError::InvalidField {
            field: name,
            value: value.to_string(),
        }
    }

    /// `ddmm.mmmm` / `dddmm.mmmm` plus hemisphere, as signed decimal degrees.
    fn coordinate(
        &self,
        value: usize,
        hemisphere: usize,
        name: &'static str,
    ) -> Result<f64, PositioningError> {
        let raw = self.get(value, name)?;
        let hemisphere = self.get(hemisphere, name)?;

        let point = raw.find('.').unwrap_or(raw.len());
        if point < 3 || !raw.is_ascii() {
            return Err(Self::invalid(name, raw));
        }
        let degrees: f64 = raw[..point - 2].parse().map_err(|_| Self::invalid(name, raw))?;
        let minutes: f64 = raw[point - 2..].parse().map_err(|_| Self::invalid(name, raw))?;
        let magnitude = degrees + minutes / 60.0;

        match (name, hemisphere) {
            ("latitude", "N") | ("longitude", "E") => Ok(magnitude),
            ("latitude", "S") | ("longitude", "W") => Ok(-magnitude),
            _ => Err(Self::invalid(name, hemisphere)),
        }
    }

    fn time(&self, index: usize) -> Result<NaiveTime, PositioningError> {
        let raw = self.get(index, "time")?;
        let whole = raw.split('.').next().unwrap_or(raw);
        NaiveTime::parse_from_str(whole, "%H%M%S").map_err(|_| Self::invalid("time", raw))
    }

    fn date(&self, index: usize) -> Result<NaiveDate, PositioningError> {
        let raw = self.get(index, "date")?;
        NaiveDate::parse_from_str(raw, "%d%m%y").map_err(|_| Self::invalid("date", raw))
    }

    fn status(&self, index: usize) -> Result<FixStatus, PositioningError> {
        match self.get(index, "status")? {
            "A" => Ok(FixStatus::Valid),
            "V" => Ok(FixStatus::Invalid),
            other => Err(Self::invalid("status", other)),
        }
    }

    fn id(&self, index: usize, name: &'static str) -> Result<u16, PositioningError> {
        let raw = self.get(index, name)?;
        if !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Self::invalid(name, raw));
        }
        raw.parse().map_err(|_| Self::invalid(name, raw))
    }

    fn optional_number(
        &self,
        index: usize,
        name: &'static str,
    ) -> Result<Option<f64>, PositioningError> {
        match self.0.get(index).map(|f| f.trim()) {
            None | Some("") => Ok(None),
            Some(raw) => raw.parse().map(Some).map_err(|_| Self::invalid(name, raw)),
        }
    }
}
