#[derive(Debug, Clone, PartialEq)]
pub struct PanelRecord {
    pub id: i64,
    pub serial: String,
    pub longitude: f64,
    pub latitude: f64,
    pub brand: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewPanelRecord {
    pub serial: String,
    pub longitude: f64,
    pub latitude: f64,
    pub brand: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HourlyElectricityRecord {
    pub id: i64,
    pub panel_id: i64,
    pub panel_serial: String,
    pub generated_electricity: i64,
    pub reading_at: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewHourlyElectricityRecord {
    pub panel_id: i64,
    pub generated_electricity: i64,
    pub reading_at: String,
}
