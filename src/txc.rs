use std::io::BufRead;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{
    error::TResult,
    models::{
        JourneyPattern, JourneyPatternSection, Operator, Route, RouteSection, Service, StopPoint,
        VehicleJourney,
    },
    parsing,
    xml::XmlReader,
};

// ------------------------------------------------------------------------------------------------
// --- TxcDocument
// ------------------------------------------------------------------------------------------------

/// A parsed TransXChange document. Immutable once parsed; every collection
/// iterates in document order, cross-references are resolved by id.
///
/// Parsing is tolerant: empty or unrecognizable input yields a document with
/// zero counts, entities with dangling references are dropped and reported
/// through [`warnings`](Self::warnings).
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct TxcDocument {
    pub(crate) filename: Option<String>,
    pub(crate) schema_version: String,
    pub(crate) operators: Vec<Operator>,
    pub(crate) stop_points: Vec<StopPoint>,
    pub(crate) services: Vec<Service>,
    pub(crate) journey_patterns: Vec<JourneyPattern>,
    pub(crate) journey_pattern_sections: Vec<JourneyPatternSection>,
    pub(crate) vehicle_journeys: Vec<VehicleJourney>,
    pub(crate) routes: Vec<Route>,
    pub(crate) route_sections: Vec<RouteSection>,
    pub(crate) warnings: Vec<String>,
}

impl TxcDocument {
    pub fn from_path<P: AsRef<Path>>(path: P) -> TResult<Self> {
        let mut reader = XmlReader::from_path(path)?;
        Ok(parsing::parse_document(&mut reader)?)
    }

    pub fn from_string(content: &str) -> TResult<Self> {
        let mut reader = XmlReader::from_bytes(content.as_bytes());
        Ok(parsing::parse_document(&mut reader)?)
    }

    pub fn from_reader<R: BufRead>(reader: R) -> TResult<Self> {
        let mut reader = XmlReader::new(reader, None);
        Ok(parsing::parse_document(&mut reader)?)
    }

    // Getters/Setters

    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    /// `SchemaVersion` of the source document, empty if absent.
    pub fn schema_version(&self) -> &str {
        &self.schema_version
    }

    pub fn operators(&self) -> &[Operator] {
        &self.operators
    }

    pub fn stop_points(&self) -> &[StopPoint] {
        &self.stop_points
    }

    pub fn services(&self) -> &[Service] {
        &self.services
    }

    pub fn journey_patterns(&self) -> &[JourneyPattern] {
        &self.journey_patterns
    }

    pub fn journey_pattern_sections(&self) -> &[JourneyPatternSection] {
        &self.journey_pattern_sections
    }

    pub fn vehicle_journeys(&self) -> &[VehicleJourney] {
        &self.vehicle_journeys
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn route_sections(&self) -> &[RouteSection] {
        &self.route_sections
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    // Counts

    pub fn operator_count(&self) -> usize {
        self.operators.len()
    }

    pub fn service_count(&self) -> usize {
        self.services.len()
    }

    pub fn stop_point_count(&self) -> usize {
        self.stop_points.len()
    }

    pub fn vehicle_journey_count(&self) -> usize {
        self.vehicle_journeys.len()
    }

    pub fn journey_pattern_section_count(&self) -> usize {
        self.journey_pattern_sections.len()
    }

    // Functions

    pub fn stop_codes(&self) -> Vec<&str> {
        self.stop_points
            .iter()
            .map(|stop_point| stop_point.atco_code())
            .collect()
    }

    pub fn operator_names(&self) -> Vec<&str> {
        self.operators
            .iter()
            .map(|operator| operator.display_name())
            .collect()
    }

    pub fn service_codes(&self) -> Vec<&str> {
        self.services
            .iter()
            .map(|service| service.service_code())
            .collect()
    }

    pub fn find_journey_pattern(&self, id: &str) -> Option<&JourneyPattern> {
        self.journey_patterns
            .iter()
            .find(|pattern| pattern.id() == id)
    }

    pub fn find_journey_pattern_section(&self, id: &str) -> Option<&JourneyPatternSection> {
        self.journey_pattern_sections
            .iter()
            .find(|section| section.id() == id)
    }
}
