use serde::{Deserialize, Serialize};

/// Current conditions as returned to clients.
///
/// Only the fields the proxy forwards are modelled; anything else in the
/// upstream payload is ignored while decoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherData {
    pub weather: Vec<WeatherDescription>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherDescription {
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_ignores_extra_fields() {
        let body = r#"{
            "coord": {"lon": 2.0, "lat": 1.0},
            "weather": [{"id": 800, "main": "Clear", "description": "clear sky", "icon": "01d"}],
            "name": "Somewhere"
        }"#;

        let data: WeatherData = serde_json::from_str(body).unwrap();

        assert_eq!(data.weather.len(), 1);
        assert_eq!(data.weather[0].description, "clear sky");
    }

    #[test]
    fn test_decode_requires_weather_list() {
        let result = serde_json::from_str::<WeatherData>(r#"{"cod": 401}"#);
        assert!(result.is_err());
    }
}
