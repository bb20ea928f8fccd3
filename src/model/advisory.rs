// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use serde::Deserialize;
use tabled::Tabled;

#[derive(Clone, Debug, Deserialize, Tabled)]
pub(crate) struct WeatherAdvice {
    #[tabled(rename = "Temperature (°C)")]
    pub(crate) temperature: f64,
    #[tabled(rename = "Humidity (%)")]
    pub(crate) humidity: f64,
    #[tabled(rename = "Conditions")]
    pub(crate) weather_condition: String,
    #[tabled(rename = "Planting")]
    pub(crate) planting_advice: String,
    #[tabled(rename = "Irrigation")]
    pub(crate) irrigation_advice: String,
    #[tabled(rename = "Pest Risk")]
    pub(crate) pest_risk: String,
    #[tabled(rename = "Humidity Advice")]
    #[serde(default)]
    pub(crate) humidity_advice: String,
}
