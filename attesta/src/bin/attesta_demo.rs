// attesta demo runner
// Registers the bundled demo test modules and executes them, printing
// the report to stdout.

use clap::Parser;

use attesta::{Arity, Harness, Matcher, MockFn, RunOptions, TestResult, TestRunner, Value};

#[derive(Parser)]
#[command(name = "attesta-demo")]
#[command(about = "Run the bundled attesta demo test modules")]
#[command(version = "0.1.0")]
struct Args {
    /// Module identifiers to run (defaults to every demo module)
    #[arg(value_name = "MODULE")]
    modules: Vec<String>,

    /// Base path prefix used to resolve module identifiers
    #[arg(long, default_value = "./")]
    path: String,
}

fn main() {
    let args = Args::parse();

    let mut runner = TestRunner::new();
    runner.register_module("./matchers", matchers_module);
    runner.register_module("./mocking", mocking_module);
    runner.register_module("./hooks", hooks_module);

    let names: Vec<&str> = if args.modules.is_empty() {
        vec!["matchers", "mocking", "hooks"]
    } else {
        args.modules.iter().map(String::as_str).collect()
    };

    futures::executor::block_on(runner.run(&names, RunOptions::with_path(args.path)));
}

async fn matchers_module(h: Harness) -> TestResult<()> {
    h.extend_matchers(|_| {
        vec![Matcher::new("toBeDecimal", Arity::Fixed(0), |reg, v, _| {
            reg.eval("toBeNumber", v, &[]).unwrap_or(false)
                && matches!(v, Value::Float(f) if f.fract() != 0.0)
        })]
    });

    let harness = h.clone();
    h.describe("Matchers", move || {
        let h = harness;
        async move {
            let hh = h.clone();
            h.it("should check types", move |_| {
                let h = hh.clone();
                async move {
                    h.expect(1).to_be_number()?;
                    h.expect(1.3).check("toBeDecimal", &[])?;
                    h.expect("hello").to_be_string()?;
                    h.expect(Value::vector(vec![1.into(), 2.into(), 3.into()]))
                        .to_be_array()?;
                    h.expect(Value::map([("hello", Value::from("World"))]))
                        .to_be_object()?;
                    h.expect(true).to_be_boolean()?;
                    h.expect(Value::timestamp("2000-02-01T00:00:00Z"))
                        .to_be_date()?;

                    h.expect("1").not().to_be_number()?;
                    h.expect(1).not().check("toBeDecimal", &[])?;
                    h.expect(1).not().to_be_string()?;
                    h.expect("[1, 2, 3]").not().to_be_array()?;
                    h.expect("{ hello: World }").not().to_be_object()?;
                    h.expect("true").not().to_be_boolean()?;
                    h.expect(Value::timestamp("")).not().to_be_date()?;
                    Ok(())
                }
            })?;

            let hh = h.clone();
            h.it("should check truthyness", move |_| {
                let h = hh.clone();
                async move {
                    h.expect(1).to_be_truthy()?;
                    h.expect("hello world").to_be_truthy()?;
                    h.expect(true).to_be_truthy()?;

                    h.expect(0).not().to_be_truthy()?;
                    h.expect("").not().to_be_truthy()?;
                    h.expect(false).not().to_be_truthy()?;
                    h.expect(Value::Nil).not().to_be_truthy()?;
                    h.expect(f64::NAN).not().to_be_truthy()?;
                    Ok(())
                }
            })?;

            let hh = h.clone();
            h.it("should check equality", move |_| {
                let h = hh.clone();
                async move {
                    h.expect(1).to_be(1)?;
                    h.expect("hello").to_be("hello")?;
                    h.expect(Value::vector(vec![1.into(), 2.into(), 3.into()]))
                        .to_be(Value::vector(vec![1.into(), 2.into(), 3.into()]))?;
                    h.expect(Value::map([
                        ("hello", Value::from("World")),
                        ("hola", Value::Nil),
                    ]))
                    .to_be(Value::map([("hello", Value::from("World"))]))?;

                    h.expect(2).not().to_be(1)?;
                    h.expect(Value::vector(vec![1.into(), 2.into()]))
                        .not()
                        .to_be(Value::vector(vec![1.into(), 2.into(), 3.into()]))?;
                    Ok(())
                }
            })?;

            let hh = h.clone();
            h.it("should handle async tests", move |_| {
                let h = hh.clone();
                async move {
                    let value = async { 1 }.await;
                    h.expect(value).to_be(1)?;
                    Ok(())
                }
            })?;

            Ok(())
        }
    })
    .await
}

async fn mocking_module(h: Harness) -> TestResult<()> {
    let harness = h.clone();
    h.describe("Mocking", move || {
        let h = harness;
        async move {
            let hh = h.clone();
            h.it("should mock functions", move |_| {
                let h = hh.clone();
                async move {
                    let mock = MockFn::new();
                    let other = MockFn::new();

                    mock.call(vec![1.into(), 2.into(), 3.into()]);
                    h.expect(mock.clone())
                        .to_have_been_called()?
                        .to_have_been_called_times(1)?
                        .to_have_been_called_with(vec![1.into(), 2.into(), 3.into()])?;

                    h.expect(other).not().to_have_been_called()?;

                    mock.call(vec![4.into(), 5.into(), 6.into()]);
                    h.expect(mock)
                        .not()
                        .to_have_been_called_times(1)?
                        .not()
                        .to_have_been_called_with(vec![7.into(), 8.into(), 9.into()])?;
                    Ok(())
                }
            })?;

            let hh = h.clone();
            h.it("should change implementation of mocked function", move |_| {
                let h = hh.clone();
                async move {
                    let mock = MockFn::with_impl(|| Value::from(1));
                    h.expect(mock.call(vec![])).to_be(1)?;

                    mock.set_implementation(|| Value::from(2));
                    h.expect(mock.call(vec![])).to_be(2)?;

                    mock.return_value(3);
                    h.expect(mock.call(vec![])).to_be(3)?;

                    mock.reset();
                    h.expect(mock.call(vec![])).to_be(1)?;
                    Ok(())
                }
            })?;

            Ok(())
        }
    })
    .await
}

async fn hooks_module(h: Harness) -> TestResult<()> {
    let harness = h.clone();
    h.describe("Hooks", move || {
        let h = harness;
        async move {
            let mock = MockFn::with_impl(|| Value::from(1));

            h.before_each(|| {
                println!("      · Running before each test");
                Ok(Value::from(10))
            })?;

            let reset_target = mock.clone();
            h.after_each(move |_| {
                println!("      · Running after each test");
                reset_target.reset();
                Ok(())
            })?;

            let hh = h.clone();
            h.it("should receive state from beforeEach", move |state| {
                let h = hh.clone();
                async move {
                    h.expect(state).to_be(10)?;
                    Ok(())
                }
            })?;

            let hh = h.clone();
            let m = mock.clone();
            h.it("should reset mock after each test #1", move |_| {
                let h = hh.clone();
                let m = m.clone();
                async move {
                    h.expect(m.call(vec![])).to_be(1)?;
                    m.return_value(2);
                    Ok(())
                }
            })?;

            let hh = h.clone();
            let m = mock.clone();
            h.it("should reset mock after each test #2", move |_| {
                let h = hh.clone();
                let m = m.clone();
                async move {
                    h.expect(m.call(vec![])).to_be(1)?;
                    Ok(())
                }
            })?;

            Ok(())
        }
    })
    .await
}
