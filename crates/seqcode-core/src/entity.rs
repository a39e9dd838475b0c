use crate::code::CodeSpec;
use crate::error::GenerateError;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// Entity types that receive a sequential code when they are created.
///
/// Every kind draws from its own sequence so numbering never crosses
/// entity types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Account,
    Provider,
    Place,
    Client,
    Personnel,
    Fleet,
    Freight,
    Expense,
    AdditionalExpense,
    Invoice,
    Service,
}

const ACCOUNT: CodeSpec = CodeSpec::from_static("cuentas", "codigo_cuenta", "CTA-", 10);
const PROVIDER: CodeSpec = CodeSpec::from_static("proveedores", "codigo_proveedor", "PROV-", 10);
const PLACE: CodeSpec = CodeSpec::from_static("lugares", "codigo_lugar", "LUG-", 10);
const CLIENT: CodeSpec = CodeSpec::from_static("clientes", "codigo_cliente", "CLI-", 10);
const PERSONNEL: CodeSpec = CodeSpec::from_static("personal", "codigo_personal", "PER-", 10);
const FLEET: CodeSpec = CodeSpec::from_static("flota", "codigo_flota", "FL-", 10);
const FREIGHT: CodeSpec = CodeSpec::from_static("fletes", "codigo_flete", "FLT-", 10);
const EXPENSE: CodeSpec = CodeSpec::from_static("gastos", "id_gasto", "GST-", 10);
const ADDITIONAL_EXPENSE: CodeSpec =
    CodeSpec::from_static("gastos_adicionales", "codigo_gasto", "G-", 8);
const INVOICE: CodeSpec = CodeSpec::from_static("facturas", "codigo_factura", "FAC-", 10);
const SERVICE: CodeSpec =
    CodeSpec::from_static("servicios", "codigo_servicio_principal", "SRV-", 10);

impl EntityKind {
    pub const ALL: [EntityKind; 11] = [
        EntityKind::Account,
        EntityKind::Provider,
        EntityKind::Place,
        EntityKind::Client,
        EntityKind::Personnel,
        EntityKind::Fleet,
        EntityKind::Freight,
        EntityKind::Expense,
        EntityKind::AdditionalExpense,
        EntityKind::Invoice,
        EntityKind::Service,
    ];

    /// Returns the code spec used when creating entities of this kind.
    pub fn spec(self) -> CodeSpec {
        match self {
            EntityKind::Account => ACCOUNT,
            EntityKind::Provider => PROVIDER,
            EntityKind::Place => PLACE,
            EntityKind::Client => CLIENT,
            EntityKind::Personnel => PERSONNEL,
            EntityKind::Fleet => FLEET,
            EntityKind::Freight => FREIGHT,
            EntityKind::Expense => EXPENSE,
            EntityKind::AdditionalExpense => ADDITIONAL_EXPENSE,
            EntityKind::Invoice => INVOICE,
            EntityKind::Service => SERVICE,
        }
    }

    /// Returns the collection (table) entities of this kind are stored in.
    ///
    /// Usually the same as the sequence name; invoices and services are
    /// stored under a different name than the counter they draw from.
    pub fn collection(self) -> &'static str {
        match self {
            EntityKind::Invoice => "facturacion",
            EntityKind::Service => "servicio_principal",
            other => other.sequence(),
        }
    }

    /// Returns the sequence name of this kind.
    pub fn sequence(self) -> &'static str {
        match self {
            EntityKind::Account => "cuentas",
            EntityKind::Provider => "proveedores",
            EntityKind::Place => "lugares",
            EntityKind::Client => "clientes",
            EntityKind::Personnel => "personal",
            EntityKind::Fleet => "flota",
            EntityKind::Freight => "fletes",
            EntityKind::Expense => "gastos",
            EntityKind::AdditionalExpense => "gastos_adicionales",
            EntityKind::Invoice => "facturas",
            EntityKind::Service => "servicios",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.sequence())
    }
}

impl FromStr for EntityKind {
    type Err = GenerateError;

    /// Parses a kind from its sequence name (`"cuentas"`, `"fletes"`, ...).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityKind::ALL
            .into_iter()
            .find(|kind| kind.sequence() == s)
            .ok_or_else(|| GenerateError::InvalidArgument(format!("unknown entity kind: '{s}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn sequences_are_distinct() {
        let names: HashSet<_> = EntityKind::ALL.iter().map(|k| k.sequence()).collect();
        assert_eq!(names.len(), EntityKind::ALL.len());
    }

    #[test]
    fn spec_matches_sequence_name() {
        for kind in EntityKind::ALL {
            assert_eq!(kind.spec().sequence(), kind.sequence());
            assert!(kind.spec().validate().is_ok(), "{kind} spec is invalid");
        }
    }

    #[test]
    fn account_codes() {
        let spec = EntityKind::Account.spec();
        assert_eq!(spec.render(1).unwrap().as_str(), "CTA-0000000001");
        assert_eq!(spec.field(), "codigo_cuenta");
    }

    #[test]
    fn additional_expense_uses_short_width() {
        let spec = EntityKind::AdditionalExpense.spec();
        assert_eq!(spec.render(3).unwrap().as_str(), "G-00000003");
    }

    #[test]
    fn collections_differ_for_invoices_and_services() {
        assert_eq!(EntityKind::Invoice.collection(), "facturacion");
        assert_eq!(EntityKind::Service.collection(), "servicio_principal");
        assert_eq!(EntityKind::Place.collection(), "lugares");
    }

    #[test]
    fn parse_from_sequence_name() {
        assert_eq!("proveedores".parse::<EntityKind>().unwrap(), EntityKind::Provider);
        assert!("unknown".parse::<EntityKind>().is_err());
    }
}
