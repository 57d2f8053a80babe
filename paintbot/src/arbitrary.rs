use crate::{Action, Coordinate};

/// A map size together with a coordinate that lies on the map.
#[derive(Clone, Debug)]
pub struct PointOnMap {
    pub width: i32,
    pub height: i32,
    pub coordinate: Coordinate,
}

impl quickcheck::Arbitrary for PointOnMap {
    fn arbitrary(g: &mut quickcheck::Gen) -> Self {
        // Maps are never empty
        let width = i32::from(u8::arbitrary(g) % 100) + 1;
        let height = i32::from(u8::arbitrary(g) % 100) + 1;
        let x = i32::from(u8::arbitrary(g)) % width;
        let y = i32::from(u8::arbitrary(g)) % height;
        PointOnMap {
            width,
            height,
            coordinate: Coordinate::new(x, y),
        }
    }
}

impl quickcheck::Arbitrary for Action {
    fn arbitrary(g: &mut quickcheck::Gen) -> Self {
        *g.choose(&Action::ALL).unwrap()
    }
}
