//! Stage output records of the pricing pipeline
//!
//! Each stage is a flat record of named amounts. Wire names follow the quoting
//! sheet (`costoFinalFabricaUSD_EXW`, ...) so reports can be regenerated from
//! stored results.

use serde::{Deserialize, Serialize};

/// Stage 1: factory cost updated to today and converted to USD (EXW)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactoryCostStage {
    /// Whole years between quotation and pricing, floored at zero
    #[serde(rename = "elapsedYears")]
    pub elapsed_years: u32,

    /// (1 + annual update) ^ elapsed years
    #[serde(rename = "factorActualizacion")]
    pub update_factor: f64,

    #[serde(rename = "costoFabricaActualizadoEUR")]
    pub updated_factory_cost_eur: f64,

    /// Updated cost net of factory discount
    #[serde(rename = "costoFinalFabricaEUR_EXW")]
    pub exw_cost_eur: f64,

    /// EUR/USD base rate with buffer applied
    #[serde(rename = "tipoCambioEurUsdAplicado")]
    pub applied_eur_usd_rate: f64,

    #[serde(rename = "costoFinalFabricaUSD_EXW")]
    pub exw_cost_usd: f64,
}

/// Stage 2: origin logistics, freight and insurance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogisticsStage {
    #[serde(rename = "costosOrigenUSD")]
    pub origin_costs_usd: f64,

    #[serde(rename = "costoTotalFleteManejosUSD")]
    pub freight_and_handling_usd: f64,

    #[serde(rename = "baseParaSeguroUSD")]
    pub insurance_base_usd: f64,

    #[serde(rename = "primaSeguroUSD")]
    pub insurance_premium_usd: f64,

    #[serde(rename = "totalTransporteSeguroEXW_USD")]
    pub transport_and_insurance_usd: f64,
}

/// Stage 3: CIF value and import duties
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImportStage {
    #[serde(rename = "valorCIF_USD")]
    pub cif_value_usd: f64,

    #[serde(rename = "derechoAdvaloremUSD")]
    pub ad_valorem_duty_usd: f64,

    #[serde(rename = "baseIvaImportacionUSD")]
    pub import_vat_base_usd: f64,

    /// Import VAT; informational unless capitalised by engine config
    #[serde(rename = "ivaImportacionUSD")]
    pub import_vat_usd: f64,

    #[serde(rename = "totalCostosImportacionDutyFeesUSD")]
    pub import_costs_usd: f64,
}

/// Stage 4: landed cost in USD
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LandedCostStage {
    #[serde(rename = "transporteNacionalUSD")]
    pub national_transport_usd: f64,

    #[serde(rename = "precioNetoCompraBaseUSD_LandedCost")]
    pub landed_cost_usd: f64,
}

/// Stage 5: conversion to local currency and commercial margin
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConversionMarginStage {
    /// USD/local base rate with buffer applied
    #[serde(rename = "tipoCambioUsdLocalAplicado")]
    pub applied_usd_local_rate: f64,

    #[serde(rename = "precioNetoCompraBaseLocal")]
    pub landed_cost_local: f64,

    #[serde(rename = "margenLocal")]
    pub margin_local: f64,

    #[serde(rename = "precioVentaNetoLocal")]
    pub net_sale_price_local: f64,
}

/// Stage 6: customer discount and sale VAT
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClientPriceStage {
    #[serde(rename = "descuentoClienteLocal")]
    pub client_discount_local: f64,

    #[serde(rename = "precioNetoVentaFinalLocal")]
    pub final_net_price_local: f64,

    #[serde(rename = "ivaVentaLocal")]
    pub sale_vat_local: f64,

    /// Headline figure shown to the customer
    #[serde(rename = "precioVentaTotalClienteLocal")]
    pub total_client_price_local: f64,
}

/// The six stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageResults {
    #[serde(rename = "costo_producto")]
    pub factory_cost: FactoryCostStage,

    #[serde(rename = "logistica_seguro")]
    pub logistics: LogisticsStage,

    #[serde(rename = "importacion")]
    pub import: ImportStage,

    #[serde(rename = "landed_cost")]
    pub landed_cost: LandedCostStage,

    #[serde(rename = "conversion_margen")]
    pub conversion_margin: ConversionMarginStage,

    #[serde(rename = "precios_cliente")]
    pub client_price: ClientPriceStage,
}
