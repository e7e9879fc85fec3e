use mantle_grid::{Function, Grid};
use mantle_operator::{Args, Eq, Operator, Parameter, Stencil};
use mantle_persist::file;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mantle_persist=debug,mantle_operator=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let grid = Grid::new(&[8, 8]).unwrap();
    let f = Function::new("f", &grid, 2);
    let op = Operator::new(&[Eq::new(f.center(), f.center() + 1.0)]).unwrap();

    op.apply(&Args::new()).unwrap();
    println!("after first run: f[4,4] = {}", f.get(&[4, 4]));

    let path = std::env::temp_dir().join("mantle-demo").join("op.mantle");
    file::save(&op, &path).unwrap();
    println!("checkpoint written to {}", path.display());

    // A resumed run continues from the carrier state inside the checkpoint.
    let resumed: Operator = file::load(&path).unwrap();
    resumed.apply(&Args::new()).unwrap();

    let carrier = resumed
        .parameters()
        .iter()
        .find_map(|p| match p {
            Parameter::Function(f) if f.name() == "f" => Some(f.clone()),
            _ => None,
        })
        .unwrap();
    println!("after resumed run: f[4,4] = {}", carrier.get(&[4, 4]));
    println!("original process copy untouched: f[4,4] = {}", f.get(&[4, 4]));
}
