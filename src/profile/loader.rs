//! Load cost profiles from CSV
//!
//! Expected header (percentages as decimal fractions):
//! `id,name,description,descuentoFabricaPct,descuentoClientePct,bufferEurUsdPct,
//! bufferUsdLocalPct,tasaSeguroPct,margenAdicionalPct,derechoAdValoremPct,ivaPct,
//! factorActualizacionAnualPct,costoLogisticaOrigenEUR,fleteMaritimoUSD,
//! recargosDestinoUSD,costoAgenteAduanaUSD,gastosPortuariosOtrosUSD,transporteNacionalLocal`

use std::path::Path;

use chrono::Utc;
use csv::Reader;

use super::data::{CostParameters, CostProfile};
use crate::error::{PricingError, Result};

/// Default location of the profile sheet
pub const DEFAULT_PROFILES_PATH: &str = "data/profiles.csv";

/// Raw CSV row matching the profile sheet columns
#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    id: String,
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(rename = "descuentoFabricaPct")]
    factory_discount_pct: f64,
    #[serde(rename = "descuentoClientePct")]
    client_discount_pct: f64,
    #[serde(rename = "bufferEurUsdPct")]
    eur_usd_buffer_pct: f64,
    #[serde(rename = "bufferUsdLocalPct")]
    usd_local_buffer_pct: f64,
    #[serde(rename = "tasaSeguroPct")]
    insurance_rate_pct: f64,
    #[serde(rename = "margenAdicionalPct")]
    margin_pct: f64,
    #[serde(rename = "derechoAdValoremPct")]
    ad_valorem_duty_pct: f64,
    #[serde(rename = "ivaPct")]
    vat_pct: f64,
    #[serde(rename = "factorActualizacionAnualPct")]
    annual_update_pct: f64,
    #[serde(rename = "costoLogisticaOrigenEUR")]
    origin_logistics_eur: f64,
    #[serde(rename = "fleteMaritimoUSD")]
    ocean_freight_usd: f64,
    #[serde(rename = "recargosDestinoUSD")]
    destination_surcharges_usd: f64,
    #[serde(rename = "costoAgenteAduanaUSD")]
    customs_broker_usd: f64,
    #[serde(rename = "gastosPortuariosOtrosUSD")]
    port_charges_usd: f64,
    #[serde(rename = "transporteNacionalLocal")]
    national_transport_local: f64,
}

impl CsvRow {
    fn into_profile(self) -> Result<CostProfile> {
        if self.id.trim().is_empty() {
            return Err(PricingError::invalid("profile row with empty id"));
        }

        let params = CostParameters {
            factory_discount_pct: self.factory_discount_pct,
            client_discount_pct: self.client_discount_pct,
            eur_usd_buffer_pct: self.eur_usd_buffer_pct,
            usd_local_buffer_pct: self.usd_local_buffer_pct,
            insurance_rate_pct: self.insurance_rate_pct,
            margin_pct: self.margin_pct,
            ad_valorem_duty_pct: self.ad_valorem_duty_pct,
            vat_pct: self.vat_pct,
            annual_update_pct: self.annual_update_pct,
            origin_logistics_eur: self.origin_logistics_eur,
            ocean_freight_usd: self.ocean_freight_usd,
            destination_surcharges_usd: self.destination_surcharges_usd,
            customs_broker_usd: self.customs_broker_usd,
            port_charges_usd: self.port_charges_usd,
            national_transport_local: self.national_transport_local,
        };
        params
            .validate()
            .map_err(|e| PricingError::invalid(format!("profile {}: {}", self.id, e)))?;

        let now = Utc::now();
        Ok(CostProfile {
            id: self.id,
            name: self.name,
            description: self.description.filter(|d| !d.trim().is_empty()),
            params,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Load all profiles from a CSV file
pub fn load_profiles<P: AsRef<Path>>(path: P) -> Result<Vec<CostProfile>> {
    let reader = Reader::from_path(path)?;
    collect_profiles(reader)
}

/// Load profiles from any reader (e.g., string buffer, network stream)
pub fn load_profiles_from_reader<R: std::io::Read>(reader: R) -> Result<Vec<CostProfile>> {
    collect_profiles(Reader::from_reader(reader))
}

fn collect_profiles<R: std::io::Read>(mut reader: Reader<R>) -> Result<Vec<CostProfile>> {
    let mut profiles = Vec::new();

    for result in reader.deserialize() {
        let row: CsvRow = result?;
        profiles.push(row.into_profile()?);
    }

    Ok(profiles)
}
