use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use pgf_gateway::models::work_order::{EntradaNumerica, ItemInput, TipoItem, WorkOrderFormInput};
use pgf_gateway::services::payload_builder::build_work_order_payload;
use pgf_gateway::services::validate_work_order;
use pgf_gateway::utils::normalization::normalizar_patente;
use pgf_gateway::utils::validation::{
    validate_password, validate_patente, MSG_PASSWORD_ESPECIAL, MSG_PASSWORD_LARGO,
    MSG_PASSWORD_MAYUSCULA, MSG_PASSWORD_MINUSCULA, MSG_PASSWORD_NUMERO,
};

fn reglas_incumplidas(password: &str) -> usize {
    [
        password.chars().count() < 8,
        !password.chars().any(|c| c.is_ascii_uppercase()),
        !password.chars().any(|c| c.is_ascii_lowercase()),
        !password.chars().any(|c| c.is_ascii_digit()),
        !password.chars().any(|c| !c.is_alphanumeric() && !c.is_whitespace()),
    ]
    .iter()
    .filter(|x| **x)
    .count()
}

fn patente_con_ruido() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z]{2}[ _-]?[0-9]{4}",
        "[a-zA-Z]{4}[ _-]?[0-9]{2}",
    ]
}

fn item() -> impl Strategy<Value = ItemInput> {
    (
        prop::option::of("[a-z]{1,10}"),
        1u32..50,
        prop::option::of(0u32..100_000),
    )
        .prop_map(|(descripcion, cantidad, costo)| ItemInput {
            tipo: if descripcion.is_some() {
                TipoItem::Servicio
            } else {
                TipoItem::Repuesto
            },
            repuesto: descripcion.is_none().then(|| "7".to_string()),
            descripcion,
            cantidad: Some(EntradaNumerica::Texto(cantidad.to_string())),
            costo_unitario: costo.map(|c| EntradaNumerica::Texto(format!("{},5", c))),
        })
}

proptest! {
    #[test]
    fn password_lista_cada_regla_incumplida(password in "[a-zA-Z0-9!@# ]{1,12}") {
        let esperadas = reglas_incumplidas(&password);
        match validate_password(&password) {
            None => prop_assert_eq!(esperadas, 0),
            Some(msg) => {
                let listadas = [
                    MSG_PASSWORD_LARGO,
                    MSG_PASSWORD_MAYUSCULA,
                    MSG_PASSWORD_MINUSCULA,
                    MSG_PASSWORD_NUMERO,
                    MSG_PASSWORD_ESPECIAL,
                ]
                .iter()
                .filter(|frase| msg.contains(*frase))
                .count();
                prop_assert_eq!(listadas, esperadas);
            }
        }
    }

    #[test]
    fn patente_valida_se_normaliza(raw in patente_con_ruido()) {
        prop_assert!(validate_patente(&raw).is_none());
        let normalizada = normalizar_patente(&raw).unwrap();
        prop_assert_eq!(normalizada.clone(), normalizada.to_uppercase());
        prop_assert!(!normalizada.contains(' ') && !normalizada.contains('-'));
        prop_assert_eq!(normalizar_patente(&normalizada), Some(normalizada));
    }

    #[test]
    fn patente_con_otra_forma_se_rechaza(raw in prop_oneof![
        "[A-Z]{3}[0-9]{3}",
        "[A-Z]{2}[0-9]{5}",
        "[A-Z]{5}[0-9]{1}",
        "[0-9]{6}",
    ]) {
        prop_assert!(validate_patente(&raw).is_some());
    }

    #[test]
    fn patente_rechazada_no_se_normaliza(raw in "[ -~]{1,10}") {
        if validate_patente(&raw).is_some() {
            prop_assert_eq!(normalizar_patente(&raw), None);
        }
    }

    #[test]
    fn payload_conserva_items_y_serializa_costos(items in prop::collection::vec(item(), 1..6)) {
        let input = WorkOrderFormInput {
            vehiculo: Some("1".to_string()),
            motivo: Some("Mantención".to_string()),
            responsable: Some("2".to_string()),
            items,
            ..Default::default()
        };

        prop_assert!(validate_work_order(Some(&input)).is_valid);
        let payload = build_work_order_payload(&input).unwrap();
        prop_assert_eq!(payload.items_data.len(), input.items.len());

        for (enviado, original) in payload.items_data.iter().zip(&input.items) {
            let costo = Decimal::from_str(&enviado.costo_unitario).unwrap();
            match &original.costo_unitario {
                None => prop_assert_eq!(costo, Decimal::ZERO),
                Some(_) => prop_assert!(costo > Decimal::ZERO),
            }
            prop_assert!(enviado.cantidad >= 1.0);
        }
    }
}
