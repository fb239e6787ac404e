use rust_decimal::Decimal;

use crate::error::CommandError;
use crate::exchange::SymbolRules;

/// Floor `requested` to a quantity the exchange will accept.
///
/// The result is a whole multiple of the step size, never exceeds what was
/// requested, and is expressed at exactly the precision the step size
/// implies. Fails with `QuantityTooSmall` when flooring lands below the
/// symbol's minimum.
pub fn adjust_quantity(requested: Decimal, rules: &SymbolRules) -> Result<Decimal, CommandError> {
    let steps = requested
        .checked_div(rules.step_size)
        .ok_or_else(|| CommandError::InvalidArgument("quantity out of range".to_string()))?
        .trunc();
    let mut adjusted = steps
        .checked_mul(rules.step_size)
        .ok_or_else(|| CommandError::InvalidArgument("quantity out of range".to_string()))?;
    adjusted.rescale(rules.step_size.scale());

    if adjusted < rules.min_qty {
        return Err(CommandError::QuantityTooSmall { min: rules.min_qty });
    }

    Ok(adjusted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn rules(min_qty: Decimal, step_size: Decimal) -> SymbolRules {
        SymbolRules { min_qty, step_size }
    }

    #[test]
    fn exact_multiple_passes_through_at_step_precision() {
        let adjusted = adjust_quantity(dec!(0.002), &rules(dec!(0.0001), dec!(0.0001))).unwrap();
        assert_eq!(adjusted, dec!(0.002));
        assert_eq!(adjusted.to_string(), "0.0020");
    }

    #[test]
    fn non_multiple_floors_to_the_step_grid() {
        let adjusted = adjust_quantity(dec!(0.00256), &rules(dec!(0.0001), dec!(0.0001))).unwrap();
        assert_eq!(adjusted.to_string(), "0.0025");
    }

    #[test]
    fn integer_steps_drop_the_fraction() {
        let adjusted = adjust_quantity(dec!(5.7), &rules(dec!(1), dec!(1))).unwrap();
        assert_eq!(adjusted.to_string(), "5");
    }

    #[test]
    fn step_scale_is_preserved_including_trailing_zeros() {
        let adjusted =
            adjust_quantity(dec!(5.7), &rules(dec!(1.00000000), dec!(1.00000000))).unwrap();
        assert_eq!(adjusted.to_string(), "5.00000000");
    }

    #[test]
    fn result_below_minimum_is_refused() {
        let err = adjust_quantity(dec!(0.00009), &rules(dec!(0.0001), dec!(0.0001))).unwrap_err();
        match err {
            CommandError::QuantityTooSmall { min } => assert_eq!(min, dec!(0.0001)),
            other => panic!("expected QuantityTooSmall, got {other}"),
        }
    }

    #[test]
    fn requested_below_one_step_is_refused() {
        let err = adjust_quantity(dec!(0.00004), &rules(dec!(0.00005), dec!(0.0001))).unwrap_err();
        assert!(matches!(err, CommandError::QuantityTooSmall { .. }));
    }

    #[test]
    fn adjusted_never_exceeds_requested() {
        let cases = [
            (dec!(0.1), dec!(0.0001)),
            (dec!(3.333333), dec!(0.01)),
            (dec!(1234.56789), dec!(0.5)),
            (dec!(0.00012345), dec!(0.00001)),
        ];
        for (requested, step) in cases {
            let adjusted = adjust_quantity(requested, &rules(step, step)).unwrap();
            assert!(adjusted <= requested, "{adjusted} > {requested}");
            assert!(
                (adjusted / step).fract().is_zero(),
                "{adjusted} is not a multiple of {step}"
            );
        }
    }
}
