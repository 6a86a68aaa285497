use crate::error::MonitorError;
use chrono::NaiveDate;
use image::DynamicImage;
use std::fmt;

/// A WGS84 longitude/latitude rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub lon_min: f64,
    pub lat_min: f64,
    pub lon_max: f64,
    pub lat_max: f64,
}

impl BoundingBox {
    pub fn new(lon_min: f64, lat_min: f64, lon_max: f64, lat_max: f64) -> Result<Self, MonitorError> {
        let in_range = (-180.0..=180.0).contains(&lon_min)
            && (-180.0..=180.0).contains(&lon_max)
            && (-90.0..=90.0).contains(&lat_min)
            && (-90.0..=90.0).contains(&lat_max);
        if !in_range {
            return Err(MonitorError::InvalidBoundingBox(format!(
                "[{lon_min}, {lat_min}, {lon_max}, {lat_max}] is outside WGS84 bounds"
            )));
        }
        if lon_min >= lon_max || lat_min >= lat_max {
            return Err(MonitorError::InvalidBoundingBox(format!(
                "[{lon_min}, {lat_min}, {lon_max}, {lat_max}] has no area"
            )));
        }
        Ok(Self {
            lon_min,
            lat_min,
            lon_max,
            lat_max,
        })
    }

    /// `[lon_min, lat_min, lon_max, lat_max]`, the order imagery APIs expect.
    pub fn as_array(&self) -> [f64; 4] {
        [self.lon_min, self.lat_min, self.lon_max, self.lat_max]
    }

    /// `(lat, lon)` of the south-west corner, used as the map anchor.
    pub fn anchor(&self) -> (f64, f64) {
        (self.lat_min, self.lon_min)
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {}, {}, {}]",
            self.lon_min, self.lat_min, self.lon_max, self.lat_max
        )
    }
}

/// An inclusive monitoring window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, MonitorError> {
        if start > end {
            return Err(MonitorError::InvalidDateRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Whole days between start and end.
    pub fn monitoring_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }
}

/// A named protected area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub name: &'static str,
    pub bbox: BoundingBox,
}

const fn region(name: &'static str, bbox: [f64; 4]) -> Region {
    Region {
        name,
        bbox: BoundingBox {
            lon_min: bbox[0],
            lat_min: bbox[1],
            lon_max: bbox[2],
            lat_max: bbox[3],
        },
    }
}

/// Built-in tiger reserves of the Western Ghats.
pub static REGIONS: [Region; 4] = [
    region("Sathyamangalam Tiger Reserve", [77.0, 11.4, 77.5, 11.9]),
    region("Mudumalai Tiger Reserve", [76.3, 11.5, 76.7, 11.7]),
    region("Anamalai Tiger Reserve", [76.8, 10.2, 77.2, 10.5]),
    region("KMTR", [77.1, 8.4, 77.5, 8.8]),
];

/// Looks a region up by name, ignoring ASCII case.
pub fn find_region(name: &str) -> Result<&'static Region, MonitorError> {
    REGIONS
        .iter()
        .find(|region| region.name.eq_ignore_ascii_case(name.trim()))
        .ok_or_else(|| MonitorError::UnknownRegion(name.to_string()))
}

/// A satellite-imagery service returning a colour image for an area and window.
pub trait ImageryProvider {
    type Error: std::error::Error + Send + Sync + 'static;

    fn fetch(
        &self,
        bbox: &BoundingBox,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<DynamicImage, Self::Error>;
}
