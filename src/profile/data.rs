//! Cost profile data structures
//!
//! Percentages are stored as decimal fractions (0.06 = 6%). Fixed costs carry
//! their currency in the field name, matching the quoting sheet layout.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PricingError, Result};

/// Stable identifier of a cost profile
pub type ProfileId = String;

/// Numeric pricing parameters of a profile
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostParameters {
    // ---- Percentages ----

    /// Discount granted by the factory on the updated EXW cost
    #[serde(rename = "descuentoFabricaPct")]
    pub factory_discount_pct: f64,

    /// Discount granted to the end customer on the net sale price
    #[serde(rename = "descuentoClientePct")]
    pub client_discount_pct: f64,

    /// Risk buffer added to the EUR/USD market rate
    #[serde(rename = "bufferEurUsdPct")]
    pub eur_usd_buffer_pct: f64,

    /// Risk buffer added to the USD/local market rate
    #[serde(rename = "bufferUsdLocalPct")]
    pub usd_local_buffer_pct: f64,

    /// Insurance premium rate over the insured base
    #[serde(rename = "tasaSeguroPct")]
    pub insurance_rate_pct: f64,

    /// Commercial margin over landed cost in local currency
    #[serde(rename = "margenAdicionalPct")]
    pub margin_pct: f64,

    /// Ad valorem import duty over CIF
    #[serde(rename = "derechoAdValoremPct")]
    pub ad_valorem_duty_pct: f64,

    /// Value added tax rate (import and sale)
    #[serde(rename = "ivaPct")]
    pub vat_pct: f64,

    /// Annual factory price escalation applied per elapsed year
    #[serde(rename = "factorActualizacionAnualPct")]
    pub annual_update_pct: f64,

    // ---- Fixed costs ----

    /// Origin logistics (pickup, export handling), EUR
    #[serde(rename = "costoLogisticaOrigenEUR")]
    pub origin_logistics_eur: f64,

    /// Ocean freight, USD
    #[serde(rename = "fleteMaritimoUSD")]
    pub ocean_freight_usd: f64,

    /// Destination surcharges, USD
    #[serde(rename = "recargosDestinoUSD")]
    pub destination_surcharges_usd: f64,

    /// Customs broker fee, USD
    #[serde(rename = "costoAgenteAduanaUSD")]
    pub customs_broker_usd: f64,

    /// Port and other handling charges, USD
    #[serde(rename = "gastosPortuariosOtrosUSD")]
    pub port_charges_usd: f64,

    /// Inland transport to the customer, local currency
    #[serde(rename = "transporteNacionalLocal")]
    pub national_transport_local: f64,
}

impl CostParameters {
    fn percentages(&self) -> [(&'static str, f64); 9] {
        [
            ("descuentoFabricaPct", self.factory_discount_pct),
            ("descuentoClientePct", self.client_discount_pct),
            ("bufferEurUsdPct", self.eur_usd_buffer_pct),
            ("bufferUsdLocalPct", self.usd_local_buffer_pct),
            ("tasaSeguroPct", self.insurance_rate_pct),
            ("margenAdicionalPct", self.margin_pct),
            ("derechoAdValoremPct", self.ad_valorem_duty_pct),
            ("ivaPct", self.vat_pct),
            ("factorActualizacionAnualPct", self.annual_update_pct),
        ]
    }

    fn fixed_costs(&self) -> [(&'static str, f64); 6] {
        [
            ("costoLogisticaOrigenEUR", self.origin_logistics_eur),
            ("fleteMaritimoUSD", self.ocean_freight_usd),
            ("recargosDestinoUSD", self.destination_surcharges_usd),
            ("costoAgenteAduanaUSD", self.customs_broker_usd),
            ("gastosPortuariosOtrosUSD", self.port_charges_usd),
            ("transporteNacionalLocal", self.national_transport_local),
        ]
    }

    /// Check that every percentage is finite and >= -1 and every fixed cost is finite and >= 0
    pub fn validate(&self) -> Result<()> {
        for (name, value) in self.percentages() {
            if !value.is_finite() || value < -1.0 {
                return Err(PricingError::invalid(format!(
                    "{} must be a finite fraction >= -1, got {}",
                    name, value
                )));
            }
        }

        for (name, value) in self.fixed_costs() {
            if !value.is_finite() || value < 0.0 {
                return Err(PricingError::invalid(format!(
                    "{} must be a finite amount >= 0, got {}",
                    name, value
                )));
            }
        }

        Ok(())
    }
}

impl Default for CostParameters {
    fn default() -> Self {
        Self {
            factory_discount_pct: 0.0,
            client_discount_pct: 0.0,
            eur_usd_buffer_pct: 0.0,
            usd_local_buffer_pct: 0.0,
            insurance_rate_pct: 0.0,
            margin_pct: 0.0,
            ad_valorem_duty_pct: 0.0,
            vat_pct: 0.0,
            annual_update_pct: 0.0,
            origin_logistics_eur: 0.0,
            ocean_freight_usd: 0.0,
            destination_surcharges_usd: 0.0,
            customs_broker_usd: 0.0,
            port_charges_usd: 0.0,
            national_transport_local: 0.0,
        }
    }
}

/// A named, reusable bundle of pricing parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostProfile {
    pub id: ProfileId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(flatten)]
    pub params: CostParameters,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied by an administrator when creating or editing a profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCostProfile {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(flatten)]
    pub params: CostParameters,
}

impl NewCostProfile {
    pub fn new(name: impl Into<String>, params: CostParameters) -> Self {
        Self {
            name: name.into(),
            description: None,
            params,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(PricingError::invalid("profile name must not be empty"));
        }
        self.params.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_parameters_valid() {
        assert!(CostParameters::default().validate().is_ok());
    }

    #[test]
    fn test_percentage_lower_bound() {
        let params = CostParameters {
            margin_pct: -1.0,
            ..Default::default()
        };
        assert!(params.validate().is_ok());

        let params = CostParameters {
            margin_pct: -1.01,
            ..Default::default()
        };
        let err = params.validate().unwrap_err();
        assert!(err.to_string().contains("margenAdicionalPct"));
    }

    #[test]
    fn test_non_finite_rejected() {
        let params = CostParameters {
            vat_pct: f64::NAN,
            ..Default::default()
        };
        assert!(params.validate().is_err());

        let params = CostParameters {
            ocean_freight_usd: f64::INFINITY,
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_negative_fixed_cost_rejected() {
        let params = CostParameters {
            customs_broker_usd: -10.0,
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_blank_name_rejected() {
        let new = NewCostProfile::new("  ", CostParameters::default());
        assert!(new.validate().is_err());
    }

    #[test]
    fn test_wire_names() {
        let params = CostParameters {
            factory_discount_pct: 0.1,
            ..Default::default()
        };
        let json = serde_json::to_value(params).unwrap();
        assert_eq!(json["descuentoFabricaPct"], 0.1);
        assert!(json.get("transporteNacionalLocal").is_some());
    }
}
