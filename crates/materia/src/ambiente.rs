//! # Ambiente — Scene Environment Settings
//!
//! Ambient light color and the time-of-day cycle, saved with the scene under
//! the `ambiente` key.
//!
//! Every field has a default and the record is read with
//! `#[serde(default)]`, so a document written before a field existed (or
//! without `ambiente` at all) loads with the defaults filled in.
//!
//! `hora` and `duracionDia` are written as strings, as the editor stores them.
//! Both numbers and numeric strings are accepted on read; anything else falls
//! back to the default.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::math::Color;

/// Ambient light at night.
pub const NIGHT_LIGHT: Color = Color::rgb(0x1a, 0x1a, 0x2a);
/// Ambient light at day.
pub const DAY_LIGHT: Color = Color::rgb(0xff, 0xfa, 0xcd);

/// Day-cycle color keyframes: (hour, color). First and last must match.
const HOUR_KEYFRAMES: [(f32, Color); 7] = [
    (0.0, Color::rgb(10, 10, 40)),
    (5.0, Color::rgb(20, 20, 60)),
    (7.0, Color::rgb(255, 120, 50)),
    (12.0, Color::rgb(255, 255, 240)),
    (17.0, Color::rgb(255, 150, 80)),
    (19.0, Color::rgb(50, 50, 100)),
    (24.0, Color::rgb(10, 10, 40)),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Ambiente {
    pub luz_ambiental: Color,
    /// Hour of day, `0.0..24.0`.
    #[serde(with = "number_as_string")]
    pub hora: f32,
    pub ciclo_automatico: bool,
    /// Length of a full day in seconds.
    #[serde(with = "number_as_string")]
    pub duracion_dia: f32,
    /// Light masking mode: `"ninguna"` or `"layers"`.
    pub mascara_tipo: String,
}

impl Default for Ambiente {
    fn default() -> Self {
        Self {
            luz_ambiental: NIGHT_LIGHT,
            hora: 12.0,
            ciclo_automatico: false,
            duracion_dia: 60.0,
            mascara_tipo: "ninguna".into(),
        }
    }
}

impl Ambiente {
    pub fn set_night(&mut self) {
        self.luz_ambiental = NIGHT_LIGHT;
    }

    pub fn set_day(&mut self) {
        self.luz_ambiental = DAY_LIGHT;
    }

    pub fn uses_layer_masks(&self) -> bool {
        self.mascara_tipo == "layers"
    }

    /// Advance the day cycle by `dt` seconds. Does nothing unless
    /// `ciclo_automatico` is on. The ambient light follows the whole hour.
    pub fn update(&mut self, dt: f32) {
        if !self.ciclo_automatico {
            return;
        }
        let day = if self.duracion_dia > 0.0 { self.duracion_dia } else { 60.0 };
        let seconds_per_hour = day / 24.0;
        self.hora += dt / seconds_per_hour;
        if self.hora >= 24.0 {
            self.hora = 0.0;
        }
        self.luz_ambiental = color_for_hour(self.hora.floor());
    }
}

/// Ambient light for an hour of the day, interpolated between keyframes.
pub fn color_for_hour(hour: f32) -> Color {
    let hour = hour.rem_euclid(24.0);
    for pair in HOUR_KEYFRAMES.windows(2) {
        let (start_hour, start) = pair[0];
        let (end_hour, end) = pair[1];
        if hour >= start_hour && hour < end_hour {
            let t = (hour - start_hour) / (end_hour - start_hour);
            let lerp = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
            return Color::rgb(lerp(start.r, end.r), lerp(start.g, end.g), lerp(start.b, end.b));
        }
    }
    HOUR_KEYFRAMES[0].1
}

mod number_as_string {
    use super::*;

    pub fn serialize<S: Serializer>(value: &f32, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f32, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f32),
            Text(String),
            Other(serde_json::Value),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Number(n) => n,
            Raw::Text(text) => text.trim().parse().unwrap_or_else(|_| {
                log::warn!("Ambiente: '{text}' is not a number, using 0");
                0.0
            }),
            Raw::Other(value) => {
                log::warn!("Ambiente: expected a number, got {value}");
                0.0
            }
        })
    }
}
