use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

//the single long position a run may carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Position {
    #[default]
    Flat,
    Holding {
        //close of the bar the position was opened on
        buy_price: Decimal,

        //trigger for the next bar's sell rule
        stop_loss_price: Decimal,
    },
}

impl Position {
    //returns true if no position is open
    pub fn is_flat(&self) -> bool {
        matches!(self, Position::Flat)
    }

    //returns true if a long position is open
    pub fn is_holding(&self) -> bool {
        matches!(self, Position::Holding { .. })
    }

    pub fn stop_loss_price(&self) -> Option<Decimal> {
        match self {
            Position::Holding {
                stop_loss_price, ..
            } => Some(*stop_loss_price),
            Position::Flat => None,
        }
    }

    //moves the trailing stop, no-op when flat
    pub fn trail_stop(&mut self, new_stop: Decimal) {
        if let Position::Holding {
            stop_loss_price, ..
        } = self
        {
            *stop_loss_price = new_stop;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn starts_flat() {
        let position = Position::default();
        assert!(position.is_flat());
        assert_eq!(position.stop_loss_price(), None);
    }

    #[test]
    fn trailing_only_moves_an_open_position() {
        let mut flat = Position::Flat;
        flat.trail_stop(dec!(9));
        assert_eq!(flat, Position::Flat);

        let mut holding = Position::Holding {
            buy_price: dec!(10),
            stop_loss_price: dec!(9.9),
        };
        holding.trail_stop(dec!(10.89));
        assert!(holding.is_holding());
        assert_eq!(holding.stop_loss_price(), Some(dec!(10.89)));
    }
}
