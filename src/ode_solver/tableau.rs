use nalgebra::{DMatrix, DVector};

use crate::Scalar;

/// A butcher tableau for a Runge-Kutta method.
///
/// The tableau is defined by the matrices `a`, `b`, `c` and `d` and the order of the method.
/// The butchers tableau is often depicted like this example of a 3-stage method:
///
/// ```text
/// c1 | a11 0   0
/// c2 | a21 a22 0
/// c3 | a31 a32 a33
/// -------------------
///   | b1  b2  b3
///   | be1 be2 be3
/// -------------------
///   | d1  d2  d3
/// ```
///
/// where `be` is the embedded method for error control and `d` is the difference between the main and embedded method.
///
/// For continous extension methods, the beta matrix is also included. Row `i` of `beta` holds the coefficients of the
/// polynomial in `theta` (lowest power first, starting at `theta^1`) that weights stage `i` of the dense output.
#[derive(Clone, Debug)]
pub struct Tableau<T: Scalar> {
    a: DMatrix<T>,
    b: DVector<T>,
    c: DVector<T>,
    d: DVector<T>,
    order: usize,
    beta: Option<DMatrix<T>>,
}

fn vector<T: Scalar>(values: &[f64]) -> DVector<T> {
    DVector::from_iterator(values.len(), values.iter().map(|&v| T::constant(v)))
}

impl<T: Scalar> Tableau<T> {
    /// Dormand-Prince 5(4) method with the 4th order continuous extension of Shampine.
    ///
    /// from J. R. Dormand, P. J. Prince, A family of embedded Runge-Kutta formulae, Journal of Computational and Applied Mathematics, 6(1), 1980.
    ///
    /// continuous extension from:
    /// L. F. Shampine, Some Practical Runge-Kutta Formulas, Mathematics of Computation, 46(173), 1986.
    pub fn dopri5() -> Self {
        let c = vector(&[0.0, 1.0 / 5.0, 3.0 / 10.0, 4.0 / 5.0, 8.0 / 9.0, 1.0, 1.0]);
        let b = vector(&[
            35.0 / 384.0,
            0.0,
            500.0 / 1113.0,
            125.0 / 192.0,
            -2187.0 / 6784.0,
            11.0 / 84.0,
            0.0,
        ]);
        let d = vector(&[
            -71.0 / 57600.0,
            0.0,
            71.0 / 16695.0,
            -71.0 / 1920.0,
            17253.0 / 339200.0,
            -22.0 / 525.0,
            1.0 / 40.0,
        ]);

        let mut a = DMatrix::zeros(7, 7);
        a[(1, 0)] = T::constant(1.0 / 5.0);
        a[(2, 0)] = T::constant(3.0 / 40.0);
        a[(2, 1)] = T::constant(9.0 / 40.0);
        a[(3, 0)] = T::constant(44.0 / 45.0);
        a[(3, 1)] = T::constant(-56.0 / 15.0);
        a[(3, 2)] = T::constant(32.0 / 9.0);
        a[(4, 0)] = T::constant(19372.0 / 6561.0);
        a[(4, 1)] = T::constant(-25360.0 / 2187.0);
        a[(4, 2)] = T::constant(64448.0 / 6561.0);
        a[(4, 3)] = T::constant(-212.0 / 729.0);
        a[(5, 0)] = T::constant(9017.0 / 3168.0);
        a[(5, 1)] = T::constant(-355.0 / 33.0);
        a[(5, 2)] = T::constant(46732.0 / 5247.0);
        a[(5, 3)] = T::constant(49.0 / 176.0);
        a[(5, 4)] = T::constant(-5103.0 / 18656.0);
        for j in 0..6 {
            a[(6, j)] = b[j];
        }

        // column major, one column per power of theta
        let beta = DMatrix::from_column_slice(
            7,
            4,
            &[
                1.0,
                0.0,
                0.0,
                0.0,
                0.0,
                0.0,
                0.0,
                -8048581381.0 / 2820520608.0,
                0.0,
                131558114200.0 / 32700410799.0,
                -1754552775.0 / 470086768.0,
                127303824393.0 / 49829197408.0,
                -282668133.0 / 205662961.0,
                40617522.0 / 29380423.0,
                8663915743.0 / 2820520608.0,
                0.0,
                -68118460800.0 / 10900136933.0,
                14199869525.0 / 1410260304.0,
                -318862633887.0 / 49829197408.0,
                2019193451.0 / 616988883.0,
                -110615467.0 / 29380423.0,
                -12715105075.0 / 11282082432.0,
                0.0,
                87487479700.0 / 32700410799.0,
                -10690763975.0 / 1880347072.0,
                701980252875.0 / 199316789632.0,
                -1453857185.0 / 822651844.0,
                69997945.0 / 29380423.0,
            ]
            .map(T::constant),
        );

        let order = 4;
        Self::new(a, b, c, d, order, Some(beta))
    }

    /// Tsitouras 5(4) method
    ///
    /// from Ch. Tsitouras, Runge–Kutta pairs of order 5(4) satisfying only the first column simplifying assumption, Computers & Mathematics with Applications, 62(2), 2011.
    pub fn tsit45() -> Self {
        let c = vector(&[0.0, 0.161, 0.327, 0.9, 0.9800255409045097, 1.0, 1.0]);
        let b = vector(&[
            0.09646076681806523,
            0.01,
            0.4798896504144996,
            1.379008574103742,
            -3.290069515436081,
            2.324710524099774,
            0.0,
        ]);
        let d = vector(&[
            -0.001_780_011_052_225_777,
            -0.0008164344596567469,
            0.007880878010261995,
            -0.1447110071732629,
            0.5823571654525552,
            -0.45808210592918697,
            0.015151515151515152,
        ]);

        let mut a = DMatrix::zeros(7, 7);
        a[(2, 1)] = T::constant(0.335_480_655_492_357);
        a[(3, 1)] = T::constant(-6.359448489975075);
        a[(4, 1)] = T::constant(-11.74888356406283);
        a[(5, 1)] = T::constant(-12.92096931784711);
        a[(3, 2)] = T::constant(4.362295432869581);
        a[(4, 2)] = T::constant(7.495539342889836);
        a[(5, 2)] = T::constant(8.159367898576159);
        a[(4, 3)] = T::constant(-0.09249506636175525);
        a[(5, 3)] = T::constant(-0.071_584_973_281_401);
        a[(5, 4)] = T::constant(-0.02826905039406838);
        // first column is fixed by the row sums matching c
        for i in 1..7 {
            let mut a_sum = T::zero();
            for j in 1..i {
                a_sum += a[(i, j)];
            }
            a[(i, 0)] = c[i] - a_sum;
        }
        for j in 0..6 {
            a[(6, j)] = b[j];
        }

        let beta = DMatrix::from_column_slice(
            7,
            4,
            &[
                1.0,
                0.0,
                0.0,
                0.0,
                0.0,
                0.0,
                0.0,
                -2.76370619727483,
                0.1317,
                3.93029623689475,
                -12.4110771669337,
                37.509313416511,
                -27.8965262891973,
                1.5,
                2.91325546182191,
                -0.2234,
                -5.9410338721315,
                30.3381886302823,
                -88.1789048947664,
                65.0918946747937,
                -4.0,
                -1.05308849772902,
                0.1017,
                2.49062728565125,
                -16.5481028892449,
                47.3795219628193,
                -34.8706578614966,
                2.5,
            ]
            .map(T::constant),
        );

        let order = 4;
        Self::new(a, b, c, d, order, Some(beta))
    }

    pub fn new(
        a: DMatrix<T>,
        b: DVector<T>,
        c: DVector<T>,
        d: DVector<T>,
        order: usize,
        beta: Option<DMatrix<T>>,
    ) -> Self {
        let s = c.len();
        assert_eq!(a.ncols(), s, "Invalid number of rows in a, expected {s}");
        assert_eq!(a.nrows(), s, "Invalid number of columns in a, expected {s}",);
        assert_eq!(b.len(), s, "Invalid number of elements in b, expected {s}",);
        assert_eq!(d.len(), s, "Invalid number of elements in d, expected {s}",);
        if let Some(beta) = &beta {
            assert_eq!(
                beta.nrows(),
                s,
                "Invalid number of rows in beta, expected {s}",
            );
        }
        Self {
            a,
            b,
            c,
            d,
            order,
            beta,
        }
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn s(&self) -> usize {
        self.c.len()
    }

    pub fn a(&self) -> &DMatrix<T> {
        &self.a
    }

    pub fn b(&self) -> &DVector<T> {
        &self.b
    }

    pub fn c(&self) -> &DVector<T> {
        &self.c
    }

    pub fn d(&self) -> &DVector<T> {
        &self.d
    }

    pub fn beta(&self) -> Option<&DMatrix<T>> {
        self.beta.as_ref()
    }
}
