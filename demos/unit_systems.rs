use quantity_core::labels::split_label;
use quantity_core::{Magnitude, RoleTable, UnitContext};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let s = "-".repeat(50);
    let mut ctx = UnitContext::builtin()?;

    println!("=== Unit Systems ===\n");

    println!("Test 1: Derived units");
    println!("{}", s);
    let stiffness = &ctx.unit("N")? / &ctx.unit("mm")?;
    println!(
        "1 N/mm = {} in base units ({})",
        stiffness.value(),
        ctx.format(stiffness.spec())
    );
    println!("Base form: {}", ctx.in_base(&stiffness)?);
    println!("Dimensions: {}", ctx.in_dimensions(&stiffness)?);

    println!("\n");

    println!("Test 2: Switching systems");
    println!("{}", s);
    let ratio = ctx.quantify(7.0, "ft/lbs")?;
    for system in ["US", "metric", "US"] {
        ctx.set_system(system)?;
        println!("{:>6}: {}", system, ctx.in_system(&ratio)?);
    }

    println!("\n");

    println!("Test 3: Automatic presentation units");
    println!("{}", s);
    ctx.set_system("metric")?;
    for (value, unit) in [(0.0057, "m"), (2500.0, "N"), (3.2e7, "Pa"), (86400.0, "s")] {
        let q = ctx.quantify(value, unit)?;
        println!("{:>10} {:<3} -> {}", value, unit, ctx.in_system(&q)?);
    }

    println!("\n");

    println!("Test 4: Role pins");
    println!("{}", s);
    let roles = RoleTable::from_csv_str("role,metric,US\nwidget_length,mm,in\n")?;
    ctx.set_roles(&roles)?;
    let widget = ctx.quantify(0.254, "m")?.with_role("widget_length");
    for system in ["metric", "US"] {
        ctx.set_system(system)?;
        println!("{:>6}: {}", system, ctx.in_system(&widget)?);
    }

    println!("\n");

    println!("Test 5: Labelled values");
    println!("{}", s);
    ctx.set_system("metric")?;
    let pairs = vec![
        ("beam.load [kip]", Magnitude::Scalar(12.0)),
        ("beam.span [ft]", Magnitude::Scalar(30.0)),
        ("beam.grade", Magnitude::Scalar(50.0)),
    ];
    for (label, value) in ctx.transform_pairs(pairs) {
        let unit = split_label(&label).map(|(_, unit)| unit).unwrap_or("-");
        println!("{:<24} {:>10} ({})", label, value.to_string(), unit);
    }

    println!("\n");

    println!("Test 6: Errors");
    println!("{}", s);
    for expression in ["m^2", "xyz", "kg/m/s"] {
        match ctx.unit(expression) {
            Ok(unit) => println!("{expression}: {unit}"),
            Err(err) => println!("{expression}: {err}"),
        }
    }

    Ok(())
}
