use chrono::{DateTime, Utc};

/// Series every measurement is written to.
pub const SERIES: &str = "measurements";
/// Value of the `location` tag.
pub const LOCATION: &str = "Outdoor";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    Temperature,
    Humidity,
    Pressure,
}

impl MetricType {
    /// Field order on the wire.
    pub const ALL: [MetricType; 3] = [
        MetricType::Temperature,
        MetricType::Humidity,
        MetricType::Pressure,
    ];

    pub fn field_name(&self) -> &'static str {
        match self {
            MetricType::Temperature => "temperature",
            MetricType::Humidity => "humidity",
            MetricType::Pressure => "pressure",
        }
    }
}

/// Readings of one upstream observation. A metric is `None` when it was not observed.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Conditions {
    pub temperature: Option<f64>, // °C
    pub humidity: Option<f64>,    // percent
    pub pressure: Option<f64>,    // hPa
}

impl Conditions {
    /// Keeps only strictly positive readings; zero, negative and NaN count as not observed.
    ///
    /// This drops real sub-freezing temperatures as well.
    pub fn observed(
        temperature: Option<f64>,
        humidity: Option<f64>,
        pressure: Option<f64>,
    ) -> Self {
        let positive = |v: Option<f64>| v.filter(|v| *v > 0.0);
        Self {
            temperature: positive(temperature),
            humidity: positive(humidity),
            pressure: positive(pressure),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.temperature.is_none() && self.humidity.is_none() && self.pressure.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub observed_at: DateTime<Utc>,
    pub temperature_celsius: Option<f64>,
    pub relative_humidity_percent: Option<f64>,
    pub pressure_hpa: Option<f64>,
}

impl Measurement {
    pub fn new(conditions: Conditions, observed_at: DateTime<Utc>) -> Self {
        Self {
            observed_at,
            temperature_celsius: conditions.temperature,
            relative_humidity_percent: conditions.humidity,
            pressure_hpa: conditions.pressure,
        }
    }

    pub fn observed_now(conditions: Conditions) -> Self {
        Self::new(conditions, Utc::now())
    }

    pub fn location(&self) -> &'static str {
        LOCATION
    }

    pub fn value(&self, metric: MetricType) -> Option<f64> {
        match metric {
            MetricType::Temperature => self.temperature_celsius,
            MetricType::Humidity => self.relative_humidity_percent,
            MetricType::Pressure => self.pressure_hpa,
        }
    }

    /// Present fields, in wire order.
    pub fn fields(&self) -> impl Iterator<Item = (MetricType, f64)> + '_ {
        MetricType::ALL
            .into_iter()
            .filter_map(move |m| self.value(m).map(|v| (m, v)))
    }

    /// Renders the measurement as one InfluxDB line-protocol point with a seconds timestamp.
    ///
    /// With no fields present the field set is left empty.
    pub fn to_line_protocol(&self) -> String {
        let fields = self
            .fields()
            .map(|(m, v)| format!("{}={}", m.field_name(), v))
            .collect::<Vec<_>>()
            .join(",");

        let mut line = format!("{SERIES},location={}", self.location());
        if !fields.is_empty() {
            line.push(' ');
            line.push_str(&fields);
        }
        line.push(' ');
        line.push_str(&self.observed_at.timestamp().to_string());
        line
    }
}
