use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use iconvg::{
    BrokenCanvas, DecodeOptions, Encoder, Point, RGBA, Recorder, RecorderOptions, Rectangle,
    Scalar, decode,
};

fn random_graphic(rnd: &mut Rnd, count: usize) -> Vec<u8> {
    let mut encoder = Encoder::new();
    let build = |encoder: &mut Encoder, rnd: &mut Rnd| -> Result<(), iconvg::Error> {
        encoder.set_viewbox(Rectangle::DEFAULT_VIEWBOX)?;
        for _ in 0..count {
            encoder
                .set_creg(0, false, rnd.color().into())?
                .start_path(0, rnd.point())?
                .abs_line_to(rnd.point())?
                .abs_quad_to(rnd.point(), rnd.point())?
                .abs_smooth_quad_to(rnd.point())?
                .abs_cube_to(rnd.point(), rnd.point(), rnd.point())?
                .abs_arc_to(
                    Point::new(8.0, 4.0),
                    rnd.uniform() as Scalar,
                    false,
                    true,
                    rnd.point(),
                )?
                .close_path_end_path()?;
        }
        Ok(())
    };
    build(&mut encoder, rnd).expect("failed to build graphic");
    encoder.into_bytes().expect("failed to encode graphic")
}

fn decode_benchmark(c: &mut Criterion) {
    let mut rnd = Rnd::new();
    let bytes = random_graphic(&mut rnd, 1024);
    let dst = Rectangle::new(0.0, 0.0, 256.0, 256.0);
    let options = DecodeOptions::default();

    let mut group = c.benchmark_group("decode");
    group.throughput(Throughput::Bytes(bytes.len() as u64));
    group.bench_function("nop", |b| {
        b.iter(|| {
            let mut canvas = BrokenCanvas::nop();
            decode(&mut canvas, dst, black_box(&bytes), &options)
        })
    });
    group.bench_function("recorder", |b| {
        b.iter_with_large_drop(|| {
            let mut recorder = Recorder::new();
            let _ = decode(&mut recorder, dst, black_box(&bytes), &options);
            recorder
        })
    });
    group.bench_function("recorder-cubics", |b| {
        b.iter_with_large_drop(|| {
            let options = RecorderOptions::default().with_cubics_only(true);
            let mut recorder = Recorder::with_options(options);
            let _ = decode(&mut recorder, dst, black_box(&bytes), &DecodeOptions::default());
            recorder
        })
    });
}

criterion_group!(benches, decode_benchmark);
criterion_main!(benches);

/// Very basic random number generator
#[derive(Default)]
pub struct Rnd {
    state: u32,
}

impl Rnd {
    /// Create new random number generator with seed `0`
    pub fn new() -> Self {
        Self::default()
    }

    fn step(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(214_013).wrapping_add(2_531_011) & 0x7fffffff;
        self.state >> 16
    }

    /// Sample `u32` from uniform distributes
    pub fn uniform_u32(&mut self) -> u32 {
        (self.step() & 0xffff) << 16 | (self.step() & 0xffff)
    }

    /// Sample f64 from `Uniform([0, 1])`
    pub fn uniform(&mut self) -> f64 {
        self.uniform_u32() as f64 / u32::MAX as f64
    }

    /// Generate random opaque color
    pub fn color(&mut self) -> RGBA {
        RGBA::new(
            (self.uniform_u32() % 256) as u8,
            (self.uniform_u32() % 256) as u8,
            (self.uniform_u32() % 256) as u8,
            255,
        )
    }

    /// Generate random point inside of the default view box
    pub fn point(&mut self) -> Point {
        let x = (self.uniform() * 64.0 - 32.0) as Scalar;
        let y = (self.uniform() * 64.0 - 32.0) as Scalar;
        Point::new(x, y)
    }
}
