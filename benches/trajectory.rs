use criterion::{criterion_group, criterion_main, Criterion};
use lorenzsol::{LorenzParameters, RkMethod, SceneConfig, TrajectorySampler};
use nalgebra::Vector3;

fn criterion_benchmark(c: &mut Criterion) {
    macro_rules! bench {
        ($name:ident, $method:expr, $rho:expr, $duration:expr) => {
            c.bench_function(stringify!($name), |b| {
                let sampler = TrajectorySampler::<f64>::default().with_method($method);
                let params = LorenzParameters::classical($rho);
                b.iter(|| {
                    sampler
                        .sample(&params, Vector3::new(10.0, 10.0, 10.0), $duration, 0.01)
                        .unwrap()
                })
            });
        };
    }

    bench!(dopri5_classical_30, RkMethod::Dopri5, 28.0, 30.0);
    bench!(tsit45_classical_30, RkMethod::Tsit45, 28.0, 30.0);
    bench!(dopri5_wide_30, RkMethod::Dopri5, 50.0, 30.0);
    bench!(tsit45_wide_30, RkMethod::Tsit45, 50.0, 30.0);

    c.bench_function("twin_scene", |b| {
        let scene = SceneConfig::twin_lorenz_attractor();
        b.iter(|| scene.sample().unwrap())
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
