//! Standard six-stage pricing engine
//!
//! Factory cost → logistics & insurance → import duties → landed cost →
//! conversion & margin → client price. Each stage reads only the outputs of
//! earlier stages plus the profile, years and base rates. All validation
//! happens before stage 1, so stage arithmetic never fails.

use serde::{Deserialize, Serialize};

use super::result::{CalculationInputs, PricingBreakdown};
use super::stages::{
    ClientPriceStage, ConversionMarginStage, FactoryCostStage, ImportStage, LandedCostStage,
    LogisticsStage, StageResults,
};
use super::{PricingEngine, YearSpan};
use crate::error::{PricingError, Result};
use crate::product::ProductCostSnapshot;
use crate::profile::{CostParameters, CostProfile};
use crate::rates::ExchangeRateSet;

/// Rate used to convert inland transport (quoted in local currency) to USD
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NationalTransportRate {
    /// Divide by the market USD/local rate
    #[default]
    Unbuffered,
    /// Divide by the buffered USD/local rate used for the main conversion
    Buffered,
}

/// Whether import VAT is treated as a cost
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ImportVatTreatment {
    /// Recoverable tax: reported but excluded from import costs
    #[default]
    Recoverable,
    /// Added to import costs and therefore to landed cost
    Capitalized,
}

/// Pricing policies that are not part of a cost profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    pub national_transport_rate: NationalTransportRate,
    pub import_vat: ImportVatTreatment,
}

/// Reference implementation of the pricing pipeline
#[derive(Debug, Clone, Default)]
pub struct StandardPricingEngine {
    config: EngineConfig,
}

impl StandardPricingEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn validate_inputs(
        &self,
        product: &ProductCostSnapshot,
        profile: &CostProfile,
        rates: &ExchangeRateSet,
    ) -> Result<()> {
        let cost = product.original_factory_cost_eur;
        if !cost.is_finite() || cost <= 0.0 {
            return Err(PricingError::invalid(format!(
                "factory cost of {} must be positive, got {}",
                product.code, cost
            )));
        }

        rates.validate()?;
        profile
            .params
            .validate()
            .map_err(|e| PricingError::invalid(format!("profile {}: {}", profile.id, e)))?;

        // Buffered inland transport divides by the buffered rate in stage 4
        if self.config.national_transport_rate == NationalTransportRate::Buffered
            && buffered_usd_local_rate(&profile.params, rates) <= 0.0
        {
            return Err(PricingError::invalid(format!(
                "profile {}: buffered USD/local rate must be positive",
                profile.id
            )));
        }

        Ok(())
    }

    /// Stage 1: update the factory cost for elapsed years, apply the factory
    /// discount and convert to USD with the buffered EUR/USD rate
    fn factory_cost(
        &self,
        product: &ProductCostSnapshot,
        p: &CostParameters,
        years: YearSpan,
        rates: &ExchangeRateSet,
    ) -> FactoryCostStage {
        let elapsed_years = years.elapsed_years();
        if years.current_year < years.quotation_year {
            log::debug!(
                "Quotation year {} after current year {} for {}, no update applied",
                years.quotation_year,
                years.current_year,
                product.code
            );
        }

        let update_factor = (1.0 + p.annual_update_pct).powi(elapsed_years as i32);
        let updated_factory_cost_eur = product.original_factory_cost_eur * update_factor;
        let exw_cost_eur = updated_factory_cost_eur * (1.0 - p.factory_discount_pct);
        let applied_eur_usd_rate = rates.eur_usd_base * (1.0 + p.eur_usd_buffer_pct);

        FactoryCostStage {
            elapsed_years,
            update_factor,
            updated_factory_cost_eur,
            exw_cost_eur,
            applied_eur_usd_rate,
            exw_cost_usd: exw_cost_eur * applied_eur_usd_rate,
        }
    }

    /// Stage 2: origin logistics, freight and the insurance premium
    fn logistics(&self, factory: &FactoryCostStage, p: &CostParameters) -> LogisticsStage {
        let origin_costs_usd = p.origin_logistics_eur * factory.applied_eur_usd_rate;
        let freight_and_handling_usd = p.ocean_freight_usd + p.destination_surcharges_usd;
        let insurance_base_usd = factory.exw_cost_usd + origin_costs_usd + freight_and_handling_usd;
        let insurance_premium_usd = insurance_base_usd * p.insurance_rate_pct;

        LogisticsStage {
            origin_costs_usd,
            freight_and_handling_usd,
            insurance_base_usd,
            insurance_premium_usd,
            transport_and_insurance_usd: origin_costs_usd
                + freight_and_handling_usd
                + insurance_premium_usd,
        }
    }

    /// Stage 3: CIF value, ad valorem duty and import fees
    fn import_duties(
        &self,
        factory: &FactoryCostStage,
        logistics: &LogisticsStage,
        p: &CostParameters,
    ) -> ImportStage {
        let cif_value_usd = factory.exw_cost_usd + logistics.transport_and_insurance_usd;
        let ad_valorem_duty_usd = cif_value_usd * p.ad_valorem_duty_pct;
        let import_vat_base_usd = cif_value_usd + ad_valorem_duty_usd;
        let import_vat_usd = import_vat_base_usd * p.vat_pct;

        let mut import_costs_usd = ad_valorem_duty_usd + p.customs_broker_usd + p.port_charges_usd;
        if self.config.import_vat == ImportVatTreatment::Capitalized {
            import_costs_usd += import_vat_usd;
        }

        ImportStage {
            cif_value_usd,
            ad_valorem_duty_usd,
            import_vat_base_usd,
            import_vat_usd,
            import_costs_usd,
        }
    }

    /// Stage 4: CIF plus import costs plus inland transport
    fn landed_cost(
        &self,
        import: &ImportStage,
        p: &CostParameters,
        rates: &ExchangeRateSet,
    ) -> LandedCostStage {
        let transport_rate = match self.config.national_transport_rate {
            NationalTransportRate::Unbuffered => rates.usd_local_base,
            NationalTransportRate::Buffered => buffered_usd_local_rate(p, rates),
        };
        let national_transport_usd = p.national_transport_local / transport_rate;

        LandedCostStage {
            national_transport_usd,
            landed_cost_usd: import.cif_value_usd + import.import_costs_usd + national_transport_usd,
        }
    }

    /// Stage 5: convert landed cost to local currency and add the margin
    fn conversion_margin(
        &self,
        landed: &LandedCostStage,
        p: &CostParameters,
        rates: &ExchangeRateSet,
    ) -> ConversionMarginStage {
        let applied_usd_local_rate = buffered_usd_local_rate(p, rates);
        let landed_cost_local = landed.landed_cost_usd * applied_usd_local_rate;
        let margin_local = landed_cost_local * p.margin_pct;

        ConversionMarginStage {
            applied_usd_local_rate,
            landed_cost_local,
            margin_local,
            net_sale_price_local: landed_cost_local + margin_local,
        }
    }

    /// Stage 6: customer discount, then sale VAT
    fn client_price(&self, conversion: &ConversionMarginStage, p: &CostParameters) -> ClientPriceStage {
        let client_discount_local = conversion.net_sale_price_local * p.client_discount_pct;
        let final_net_price_local = conversion.net_sale_price_local - client_discount_local;
        let sale_vat_local = final_net_price_local * p.vat_pct;

        ClientPriceStage {
            client_discount_local,
            final_net_price_local,
            sale_vat_local,
            total_client_price_local: final_net_price_local + sale_vat_local,
        }
    }
}

/// USD/local market rate with the profile buffer applied
fn buffered_usd_local_rate(p: &CostParameters, rates: &ExchangeRateSet) -> f64 {
    rates.usd_local_base * (1.0 + p.usd_local_buffer_pct)
}

impl PricingEngine for StandardPricingEngine {
    fn compute(
        &self,
        product: &ProductCostSnapshot,
        profile: &CostProfile,
        years: YearSpan,
        rates: &ExchangeRateSet,
    ) -> Result<PricingBreakdown> {
        self.validate_inputs(product, profile, rates)?;

        let p = &profile.params;
        let factory_cost = self.factory_cost(product, p, years, rates);
        let logistics = self.logistics(&factory_cost, p);
        let import = self.import_duties(&factory_cost, &logistics, p);
        let landed_cost = self.landed_cost(&import, p, rates);
        let conversion_margin = self.conversion_margin(&landed_cost, p, rates);
        let client_price = self.client_price(&conversion_margin, p);

        Ok(PricingBreakdown {
            inputs: CalculationInputs::new(product, profile, years, rates),
            calculados: StageResults {
                factory_cost,
                logistics,
                import,
                landed_cost,
                conversion_margin,
                client_price,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use chrono::Utc;

    fn profile(params: CostParameters) -> CostProfile {
        let now = Utc::now();
        CostProfile {
            id: "std".to_string(),
            name: "Standard".to_string(),
            description: None,
            params,
            created_at: now,
            updated_at: now,
        }
    }

    fn full_params() -> CostParameters {
        CostParameters {
            factory_discount_pct: 0.10,
            client_discount_pct: 0.05,
            eur_usd_buffer_pct: 0.02,
            usd_local_buffer_pct: 0.03,
            insurance_rate_pct: 0.01,
            margin_pct: 0.25,
            ad_valorem_duty_pct: 0.06,
            vat_pct: 0.19,
            annual_update_pct: 0.05,
            origin_logistics_eur: 500.0,
            ocean_freight_usd: 3_500.0,
            destination_surcharges_usd: 400.0,
            customs_broker_usd: 600.0,
            port_charges_usd: 250.0,
            national_transport_local: 475_000.0,
        }
    }

    fn product() -> ProductCostSnapshot {
        ProductCostSnapshot::new("TR-200", 100_000.0).with_quotation_date("2023-03-01")
    }

    fn years() -> YearSpan {
        YearSpan::new(2023, 2025)
    }

    fn rates() -> ExchangeRateSet {
        ExchangeRateSet::new(1.08, 950.0)
    }

    #[test]
    fn test_concrete_factory_scenario() {
        let engine = StandardPricingEngine::default();
        let result = engine
            .compute(&product(), &profile(full_params()), years(), &rates())
            .unwrap();
        let stage = result.calculados.factory_cost;

        assert_eq!(stage.elapsed_years, 2);
        assert_relative_eq!(stage.update_factor, 1.1025, max_relative = 1e-12);
        assert_relative_eq!(stage.updated_factory_cost_eur, 110_250.0, max_relative = 1e-12);
        assert_relative_eq!(stage.exw_cost_eur, 99_225.0, max_relative = 1e-12);
        assert_relative_eq!(stage.applied_eur_usd_rate, 1.1016, max_relative = 1e-12);
        assert_relative_eq!(stage.exw_cost_usd, 109_306.26, max_relative = 1e-9);
    }

    #[test]
    fn test_full_pipeline_values() {
        let engine = StandardPricingEngine::default();
        let result = engine
            .compute(&product(), &profile(full_params()), years(), &rates())
            .unwrap();
        let c = &result.calculados;

        // Stage 2
        assert_relative_eq!(c.logistics.origin_costs_usd, 550.8, max_relative = 1e-12);
        assert_relative_eq!(c.logistics.freight_and_handling_usd, 3_900.0, max_relative = 1e-12);
        assert_relative_eq!(c.logistics.insurance_base_usd, 113_757.06, max_relative = 1e-9);
        assert_relative_eq!(c.logistics.insurance_premium_usd, 1_137.5706, max_relative = 1e-9);
        assert_relative_eq!(c.logistics.transport_and_insurance_usd, 5_588.3706, max_relative = 1e-9);

        // Stage 3
        assert_relative_eq!(c.import.cif_value_usd, 114_894.6306, max_relative = 1e-9);
        assert_relative_eq!(c.import.ad_valorem_duty_usd, 6_893.677836, max_relative = 1e-9);
        assert_relative_eq!(c.import.import_costs_usd, 7_743.677836, max_relative = 1e-9);

        // Stage 4: 475000 / 950 = 500 at the unbuffered rate
        assert_relative_eq!(c.landed_cost.national_transport_usd, 500.0, max_relative = 1e-12);
        assert_relative_eq!(c.landed_cost.landed_cost_usd, 123_138.308436, max_relative = 1e-9);

        // Stage 5
        assert_relative_eq!(c.conversion_margin.applied_usd_local_rate, 978.5, max_relative = 1e-12);

        // Stage 6 headline
        let expected_net_sale = 123_138.308436 * 978.5 * 1.25;
        let expected_total = expected_net_sale * 0.95 * 1.19;
        assert_relative_eq!(result.headline_price(), expected_total, max_relative = 1e-9);
    }

    #[test]
    fn test_stage_ordering_invariants() {
        let engine = StandardPricingEngine::default();
        let p = full_params();
        let result = engine.compute(&product(), &profile(p), years(), &rates()).unwrap();
        let c = &result.calculados;

        assert_relative_eq!(
            c.import.cif_value_usd,
            c.factory_cost.exw_cost_usd + c.logistics.transport_and_insurance_usd,
            max_relative = 1e-9
        );
        assert_relative_eq!(
            c.client_price.total_client_price_local,
            c.client_price.final_net_price_local * (1.0 + p.vat_pct),
            max_relative = 1e-9
        );
    }

    #[test]
    fn test_deterministic() {
        let engine = StandardPricingEngine::default();
        let prof = profile(full_params());
        let first = engine.compute(&product(), &prof, years(), &rates()).unwrap();
        let second = engine.compute(&product(), &prof, years(), &rates()).unwrap();

        assert_eq!(first, second);
        assert_eq!(
            first.headline_price().to_bits(),
            second.headline_price().to_bits()
        );
    }

    #[test]
    fn test_zero_elapsed_years() {
        let engine = StandardPricingEngine::default();
        let result = engine
            .compute(&product(), &profile(full_params()), YearSpan::new(2025, 2025), &rates())
            .unwrap();
        let stage = result.calculados.factory_cost;

        assert_eq!(stage.elapsed_years, 0);
        assert_eq!(stage.update_factor, 1.0);
        assert_eq!(stage.updated_factory_cost_eur, 100_000.0);
    }

    #[test]
    fn test_future_quotation_year_clamped() {
        let engine = StandardPricingEngine::default();
        let result = engine
            .compute(&product(), &profile(full_params()), YearSpan::new(2027, 2025), &rates())
            .unwrap();
        assert_eq!(result.calculados.factory_cost.update_factor, 1.0);
    }

    #[test]
    fn test_discount_bounds() {
        let engine = StandardPricingEngine::default();
        for discount in [0.0, 0.1, 0.35, 0.5, 1.0] {
            let params = CostParameters {
                factory_discount_pct: discount,
                ..full_params()
            };
            let result = engine.compute(&product(), &profile(params), years(), &rates()).unwrap();
            let stage = result.calculados.factory_cost;
            assert!(stage.exw_cost_eur <= stage.updated_factory_cost_eur);
        }
    }

    #[test]
    fn test_import_vat_excluded_by_default() {
        let engine = StandardPricingEngine::default();
        let result = engine
            .compute(&product(), &profile(full_params()), years(), &rates())
            .unwrap();
        let import = result.calculados.import;

        assert!(import.import_vat_usd > 0.0);
        assert_relative_eq!(
            import.import_costs_usd,
            import.ad_valorem_duty_usd + 600.0 + 250.0,
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_import_vat_capitalized() {
        let default_engine = StandardPricingEngine::default();
        let capitalized = StandardPricingEngine::new(EngineConfig {
            import_vat: ImportVatTreatment::Capitalized,
            ..Default::default()
        });
        let prof = profile(full_params());

        let base = default_engine.compute(&product(), &prof, years(), &rates()).unwrap();
        let with_vat = capitalized.compute(&product(), &prof, years(), &rates()).unwrap();

        assert_relative_eq!(
            with_vat.calculados.landed_cost.landed_cost_usd - base.calculados.landed_cost.landed_cost_usd,
            base.calculados.import.import_vat_usd,
            max_relative = 1e-9
        );
    }

    #[test]
    fn test_buffered_national_transport() {
        let engine = StandardPricingEngine::new(EngineConfig {
            national_transport_rate: NationalTransportRate::Buffered,
            ..Default::default()
        });
        let result = engine
            .compute(&product(), &profile(full_params()), years(), &rates())
            .unwrap();

        // 475000 / (950 * 1.03)
        assert_relative_eq!(
            result.calculados.landed_cost.national_transport_usd,
            475_000.0 / 978.5,
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_zero_parameters_pass_cost_through() {
        let engine = StandardPricingEngine::default();
        let result = engine
            .compute(&product(), &profile(CostParameters::default()), years(), &rates())
            .unwrap();

        // No update, discount, buffer, freight or tax: price is cost * eur/usd * usd/local
        assert_abs_diff_eq!(result.headline_price(), 100_000.0 * 1.08 * 950.0, epsilon = 1e-6);
    }

    #[test]
    fn test_rejects_non_positive_cost() {
        let engine = StandardPricingEngine::default();
        for cost in [0.0, -5.0, f64::NAN] {
            let bad = ProductCostSnapshot::new("BAD", cost);
            let err = engine
                .compute(&bad, &profile(full_params()), years(), &rates())
                .unwrap_err();
            assert!(matches!(err, PricingError::InvalidInput(_)));
        }
    }

    #[test]
    fn test_rejects_bad_rates() {
        let engine = StandardPricingEngine::default();
        let err = engine
            .compute(&product(), &profile(full_params()), years(), &ExchangeRateSet::new(1.08, 0.0))
            .unwrap_err();
        assert!(matches!(err, PricingError::InvalidInput(_)));
    }

    #[test]
    fn test_rejects_full_negative_local_buffer() {
        let engine = StandardPricingEngine::new(EngineConfig {
            national_transport_rate: NationalTransportRate::Buffered,
            ..Default::default()
        });
        let params = CostParameters {
            usd_local_buffer_pct: -1.0,
            ..full_params()
        };
        assert!(engine.compute(&product(), &profile(params), years(), &rates()).is_err());
    }

    #[test]
    fn test_full_negative_local_buffer_unbuffered_transport() {
        let engine = StandardPricingEngine::default();
        let params = CostParameters {
            usd_local_buffer_pct: -1.0,
            ..full_params()
        };
        let result = engine
            .compute(&product(), &profile(params), years(), &rates())
            .unwrap();

        let conversion = &result.calculados.conversion_margin;
        assert_eq!(conversion.applied_usd_local_rate, 0.0);
        assert_eq!(conversion.landed_cost_local, 0.0);
        assert!(result.calculados.landed_cost.national_transport_usd.is_finite());
    }

    #[test]
    fn test_inputs_echoed() {
        let engine = StandardPricingEngine::default();
        let result = engine
            .compute(&product(), &profile(full_params()), years(), &rates())
            .unwrap();

        assert_eq!(result.inputs.profile_id, "std");
        assert_eq!(result.inputs.product_code, "TR-200");
        assert_eq!(result.inputs.quotation_year, 2023);
        assert_eq!(result.inputs.current_year, 2025);
        assert_eq!(result.inputs.eur_usd_base, 1.08);
        assert_eq!(result.inputs.usd_local_base, 950.0);
    }

    #[test]
    fn test_json_shape() {
        let engine = StandardPricingEngine::default();
        let result = engine
            .compute(&product(), &profile(full_params()), years(), &rates())
            .unwrap();
        let json = serde_json::to_value(&result).unwrap();

        let calculados = &json["calculados"];
        for stage in [
            "costo_producto",
            "logistica_seguro",
            "importacion",
            "landed_cost",
            "conversion_margen",
            "precios_cliente",
        ] {
            assert!(calculados.get(stage).is_some(), "missing stage {}", stage);
        }
        assert!(calculados["costo_producto"]["costoFinalFabricaUSD_EXW"].is_number());
        assert!(calculados["precios_cliente"]["precioVentaTotalClienteLocal"].is_number());
        assert_eq!(json["inputs"]["originalFactoryCostEUR"], 100_000.0);
    }
}
