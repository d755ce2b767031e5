use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use schoolfinder_core::school::{Address, ContactInfo, Coordinates};
use schoolfinder_core::security::ApiKey;
use schoolfinder_core::settings::PlacesSettings;
use schoolfinder_core::{Page, PageRequest, PageToken, RecordSource, School, SchoolId, SourceError};

use crate::synth;

const TEXT_SEARCH_PATH: &str = "/maps/api/place/textsearch/json";

/// Lagos localities recognised inside a free-form address, most specific first.
const KNOWN_LOCALITIES: &[&str] = &[
    "Victoria Island",
    "Lekki",
    "Ikoyi",
    "Ikeja",
    "Surulere",
    "Yaba",
    "Ajah",
    "Gbagada",
    "Maryland",
    "Magodo",
    "Festac",
    "Apapa",
    "Ikorodu",
    "Oshodi",
    "Agege",
    "Alimosho",
    "Badagry",
    "Epe",
];

/// Passthrough to the Places Text Search API. Tokens are forwarded
/// unchanged in both directions.
pub struct PlacesSource {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<ApiKey>,
    default_query: String,
    synthesize_missing: bool,
}

impl PlacesSource {
    pub fn new(settings: &PlacesSettings) -> Self {
        Self {
            client: crate::http_client(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            default_query: settings.default_query.clone(),
            synthesize_missing: settings.synthesize_missing,
        }
    }

    fn translate_all(&self, places: Vec<Place>) -> Vec<School> {
        let mut rng = rand::thread_rng();
        places
            .into_iter()
            .map(|place| {
                let mut school = translate_place(place);
                if self.synthesize_missing {
                    synth::fill_missing(&mut school, &mut rng);
                }
                school
            })
            .collect()
    }
}

#[async_trait]
impl RecordSource for PlacesSource {
    fn name(&self) -> &str {
        "places"
    }

    async fn fetch_page(&self, request: &PageRequest) -> Result<Page, SourceError> {
        let api_key = self.api_key.as_ref().ok_or_else(|| {
            SourceError::NotConfigured(format!(
                "{} not set; the places backend requires an API key",
                schoolfinder_core::settings::PLACES_KEY_ENV
            ))
        })?;

        let query = request.query.as_deref().unwrap_or(&self.default_query);
        let mut params: Vec<(&str, &str)> = vec![("query", query), ("key", api_key.expose())];
        if let Some(token) = &request.token {
            params.push(("pagetoken", token.as_str()));
        }

        let response = self
            .client
            .get(format!("{}{}", self.base_url, TEXT_SEARCH_PATH))
            .query(&params)
            .send()
            .await
            .map_err(crate::transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::from_status(status.as_u16(), body));
        }

        let body: TextSearchResponse = response.json().await.map_err(crate::transport_error)?;
        check_status(&body, request.token.is_some())?;

        debug!(returned = body.results.len(), has_more = body.next_page_token.is_some(), "places page received");

        Ok(Page {
            results: self.translate_all(body.results),
            next_page_token: body
                .next_page_token
                .filter(|t| !t.is_empty())
                .map(PageToken::from_raw),
        })
    }
}

#[derive(Debug, Deserialize)]
struct TextSearchResponse {
    #[serde(default)]
    results: Vec<Place>,
    next_page_token: Option<String>,
    status: String,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Place {
    place_id: String,
    name: String,
    geometry: Option<Geometry>,
    formatted_address: Option<String>,
    rating: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

fn check_status(body: &TextSearchResponse, had_token: bool) -> Result<(), SourceError> {
    let detail = body.error_message.clone().unwrap_or_else(|| body.status.clone());
    match body.status.as_str() {
        "OK" | "ZERO_RESULTS" => Ok(()),
        "INVALID_REQUEST" if had_token => Err(SourceError::InvalidToken(detail)),
        "INVALID_REQUEST" => Err(SourceError::Malformed(detail)),
        "REQUEST_DENIED" => Err(SourceError::Status { status: 403, body: detail }),
        "OVER_QUERY_LIMIT" => Err(SourceError::Status { status: 429, body: detail }),
        other => {
            warn!(status = other, "unexpected places status");
            Err(SourceError::Unavailable(detail))
        }
    }
}

/// Map a third-party result onto a listing. Fields the API has no notion
/// of stay absent.
fn translate_place(place: Place) -> School {
    let street = place.formatted_address.unwrap_or_default();
    let lga = locality_of(&street).unwrap_or("Lagos").to_string();
    let coordinates = place
        .geometry
        .map(|g| Coordinates {
            lat: g.location.lat,
            lng: g.location.lng,
        })
        .unwrap_or_default();

    School {
        id: SchoolId::from_raw(place.place_id),
        name: place.name,
        coordinates,
        address: Address {
            street,
            lga,
            state: "Lagos".into(),
        },
        price_range: None,
        curriculum: None,
        facilities: None,
        school_type: Some("Day".into()),
        verified: false,
        rating: place.rating.unwrap_or(0.0).clamp(0.0, 5.0),
        contact_info: ContactInfo::default(),
        image: None,
    }
}

fn locality_of(address: &str) -> Option<&'static str> {
    let lower = address.to_lowercase();
    KNOWN_LOCALITIES
        .iter()
        .copied()
        .find(|l| lower.contains(&l.to_lowercase()))
}
