mod document_parser;
mod helpers;
mod journey_pattern_section_parser;
mod operating_profile_parser;
mod operator_parser;
mod route_parser;
mod service_parser;
mod stop_point_parser;
mod vehicle_journey_parser;

pub(crate) use document_parser::parse as parse_document;
