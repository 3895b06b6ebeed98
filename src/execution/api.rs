//! Host object model exposed to Rhai scripts.
//!
//! Property and method names follow the host's camelCase API so scripts read the same
//! as they would in the host's own console: `rootComp.sketches.add(rootComp.xYConstructionPlane)`.

use std::any::Any;

use rhai::{Array, Dynamic, Engine, EvalAltResult, Map, FLOAT, INT};

use crate::host::{
    design::{
        BRepBody, Bodies, Component, ConstructionPlane, DimensionOrientation, ExtrudeFeature,
        ExtrudeFeatures, ExtrudeInput, FeatureOperation, Features, Material, PhysicalProperties,
        PlaneKind, Point3D, Profile, Profiles, Sketch, SketchCircle, SketchCircles,
        SketchDimensions, SketchLine, SketchLineList, SketchLines, SketchPoint, Sketches,
        ValueInput,
    },
    Application, Design, Documents, HostError, UserInterface,
};

type ScriptResult<T> = Result<T, Box<EvalAltResult>>;

fn host_error(err: HostError) -> Box<EvalAltResult> {
    err.to_string().into()
}

fn optional<T: Any + Clone>(value: Option<T>) -> Dynamic {
    value.map(Dynamic::from).unwrap_or(Dynamic::UNIT)
}

fn count(n: usize) -> INT {
    n as INT
}

/// The `adsk` namespace: `adsk.core` and `adsk.fusion`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdskNamespace;

#[derive(Debug, Clone, Copy)]
pub struct CoreNamespace;

#[derive(Debug, Clone, Copy)]
pub struct FusionNamespace;

#[derive(Debug, Clone, Copy)]
struct Point3DFactory;

#[derive(Debug, Clone, Copy)]
struct ValueInputFactory;

#[derive(Debug, Clone, Copy)]
struct FeatureOperations;

#[derive(Debug, Clone, Copy)]
struct DimensionOrientations;

#[derive(Debug, Clone)]
struct SketchCurves(Sketch);

#[derive(Debug, Clone)]
struct Document {
    name: String,
}

#[derive(Debug, Clone, Copy)]
struct Occurrences {
    count: usize,
}

/// The `traceback` facility: renders caught errors as text.
#[derive(Debug, Clone, Copy, Default)]
pub struct Traceback;

impl Traceback {
    /// Caught runtime errors arrive as maps carrying `message`, `line` and `position`;
    /// thrown values arrive as themselves.
    pub fn format(err: &Dynamic) -> String {
        let Some(map) = err.clone().try_cast::<Map>() else {
            return err.to_string();
        };
        let message = map
            .get("message")
            .map(|m| m.to_string())
            .unwrap_or_else(|| Dynamic::from_map(map.clone()).to_string());
        match (map.get("line"), map.get("position")) {
            (Some(line), Some(pos)) => format!("{message} (line {line}, position {pos})"),
            (Some(line), None) => format!("{message} (line {line})"),
            _ => message,
        }
    }
}

pub fn register(engine: &mut Engine) {
    register_session(engine);
    register_component(engine);
    register_sketch(engine);
    register_features(engine);
    register_bodies(engine);
    register_namespaces(engine);
}

fn register_session(engine: &mut Engine) {
    engine
        .register_type_with_name::<Application>("Application")
        .register_get("activeProduct", |app: &mut Application| optional(app.active_product()))
        .register_get("userInterface", |app: &mut Application| app.user_interface())
        .register_get("documents", |app: &mut Application| app.documents());

    engine
        .register_type_with_name::<Documents>("Documents")
        .register_get("count", |docs: &mut Documents| count(docs.count()))
        .register_fn("add", |docs: &mut Documents, name: &str| docs.add(name))
        .register_fn("closeActive", |docs: &mut Documents| -> ScriptResult<()> {
            docs.close_active().map_err(host_error)
        });

    engine
        .register_type_with_name::<UserInterface>("UserInterface")
        .register_fn("messageBox", |ui: &mut UserInterface, text: &str| ui.message_box(text))
        .register_fn("messageBox", |ui: &mut UserInterface, lines: Array| {
            let text = lines.iter().map(|line| line.to_string()).collect::<Vec<_>>().join("\n");
            ui.message_box(text)
        })
        .register_fn("messageBox", |ui: &mut UserInterface, value: Dynamic| {
            ui.message_box(value.to_string())
        });

    engine
        .register_type_with_name::<Design>("Design")
        .register_get("rootComponent", |d: &mut Design| d.root_component())
        .register_get("parentDocument", |d: &mut Design| Document {
            name: d.document_name(),
        });

    engine
        .register_type_with_name::<Document>("Document")
        .register_get("name", |doc: &mut Document| doc.name.clone());
}

fn register_component(engine: &mut Engine) {
    engine
        .register_type_with_name::<Component>("Component")
        .register_get("name", |c: &mut Component| c.name())
        .register_get("sketches", |c: &mut Component| c.sketches())
        .register_get("bRepBodies", |c: &mut Component| c.bodies())
        .register_get("features", |c: &mut Component| c.features())
        .register_get("occurrences", |c: &mut Component| Occurrences {
            count: c.occurrence_count(),
        })
        .register_get("xYConstructionPlane", |c: &mut Component| {
            c.construction_plane(PlaneKind::XY)
        })
        .register_get("xZConstructionPlane", |c: &mut Component| {
            c.construction_plane(PlaneKind::XZ)
        })
        .register_get("yZConstructionPlane", |c: &mut Component| {
            c.construction_plane(PlaneKind::YZ)
        });

    engine
        .register_type_with_name::<Occurrences>("Occurrences")
        .register_get("count", |o: &mut Occurrences| count(o.count));

    engine
        .register_type_with_name::<ConstructionPlane>("ConstructionPlane")
        .register_get("name", |p: &mut ConstructionPlane| p.kind.name().to_string());
}

fn register_sketch(engine: &mut Engine) {
    engine
        .register_type_with_name::<Sketches>("Sketches")
        .register_get("count", |s: &mut Sketches| count(s.count()))
        .register_fn("item", |s: &mut Sketches, i: INT| -> ScriptResult<Sketch> {
            s.item(i).map_err(host_error)
        })
        .register_fn("add", |s: &mut Sketches, plane: ConstructionPlane| s.add(&plane));

    engine
        .register_type_with_name::<Sketch>("Sketch")
        .register_get("name", |s: &mut Sketch| s.name())
        .register_get("referencePlane", |s: &mut Sketch| s.plane().name().to_string())
        .register_get("sketchCurves", |s: &mut Sketch| SketchCurves(s.clone()))
        .register_get("profiles", |s: &mut Sketch| s.profiles())
        .register_get("sketchDimensions", |s: &mut Sketch| s.dimensions());

    engine
        .register_type_with_name::<SketchCurves>("SketchCurves")
        .register_get("sketchLines", |c: &mut SketchCurves| c.0.lines())
        .register_get("sketchCircles", |c: &mut SketchCurves| c.0.circles());

    engine
        .register_type_with_name::<SketchLines>("SketchLines")
        .register_get("count", |l: &mut SketchLines| count(l.count()))
        .register_fn("addByTwoPoints", |l: &mut SketchLines, a: Point3D, b: Point3D| {
            l.add_by_two_points(a, b)
        })
        .register_fn("addTwoPointRectangle", |l: &mut SketchLines, a: Point3D, b: Point3D| {
            l.add_two_point_rectangle(a, b)
        });

    engine
        .register_type_with_name::<SketchLineList>("SketchLineList")
        .register_get("count", |l: &mut SketchLineList| count(l.count()))
        .register_fn("item", |l: &mut SketchLineList, i: INT| -> ScriptResult<SketchLine> {
            l.item(i).map_err(host_error)
        });

    engine
        .register_type_with_name::<SketchLine>("SketchLine")
        .register_get("startSketchPoint", |l: &mut SketchLine| l.start_point())
        .register_get("endSketchPoint", |l: &mut SketchLine| l.end_point())
        .register_get("length", |l: &mut SketchLine| l.length());

    engine
        .register_type_with_name::<SketchPoint>("SketchPoint")
        .register_get("geometry", |p: &mut SketchPoint| p.geometry);

    engine
        .register_type_with_name::<SketchCircles>("SketchCircles")
        .register_get("count", |c: &mut SketchCircles| count(c.count()))
        .register_fn(
            "addByCenterRadius",
            |c: &mut SketchCircles, center: Point3D, radius: FLOAT| -> ScriptResult<SketchCircle> {
                c.add_by_center_radius(center, radius).map_err(host_error)
            },
        )
        .register_fn(
            "addByCenterRadius",
            |c: &mut SketchCircles, center: Point3D, radius: INT| -> ScriptResult<SketchCircle> {
                c.add_by_center_radius(center, radius as FLOAT).map_err(host_error)
            },
        );

    engine
        .register_type_with_name::<SketchCircle>("SketchCircle")
        .register_get("radius", |c: &mut SketchCircle| c.radius())
        .register_get("centerSketchPoint", |c: &mut SketchCircle| SketchPoint {
            geometry: c.center(),
        });

    engine
        .register_type_with_name::<Profiles>("Profiles")
        .register_get("count", |p: &mut Profiles| count(p.count()))
        .register_fn("item", |p: &mut Profiles, i: INT| -> ScriptResult<Profile> {
            p.item(i).map_err(host_error)
        });

    engine
        .register_type_with_name::<Profile>("Profile")
        .register_get("area", |p: &mut Profile| p.area());

    engine
        .register_type_with_name::<SketchDimensions>("SketchDimensions")
        .register_get("count", |d: &mut SketchDimensions| count(d.count()))
        .register_fn(
            "addDistanceDimension",
            |d: &mut SketchDimensions,
             a: SketchPoint,
             b: SketchPoint,
             orientation: DimensionOrientation,
             text_point: Point3D| d.add_distance_dimension(&a, &b, orientation, text_point),
        );
}

fn register_features(engine: &mut Engine) {
    engine
        .register_type_with_name::<Features>("Features")
        .register_get("count", |f: &mut Features| count(f.count()))
        .register_get("extrudeFeatures", |f: &mut Features| f.extrude_features());

    engine
        .register_type_with_name::<ExtrudeFeatures>("ExtrudeFeatures")
        .register_get("count", |f: &mut ExtrudeFeatures| count(f.count()))
        .register_fn(
            "createInput",
            |f: &mut ExtrudeFeatures, profile: Profile, op: FeatureOperation| {
                f.create_input(&profile, op)
            },
        )
        .register_fn(
            "add",
            |f: &mut ExtrudeFeatures, input: ExtrudeInput| -> ScriptResult<ExtrudeFeature> {
                f.add(&input).map_err(host_error)
            },
        );

    engine
        .register_type_with_name::<ExtrudeInput>("ExtrudeInput")
        .register_get("isSymmetric", |i: &mut ExtrudeInput| i.is_symmetric())
        .register_get("operation", |i: &mut ExtrudeInput| i.operation())
        .register_fn(
            "setDistanceExtent",
            |i: &mut ExtrudeInput, symmetric: bool, distance: ValueInput| {
                i.set_distance_extent(symmetric, distance)
            },
        );

    engine
        .register_type_with_name::<ExtrudeFeature>("ExtrudeFeature")
        .register_get("name", |f: &mut ExtrudeFeature| f.name())
        .register_get("operation", |f: &mut ExtrudeFeature| f.operation())
        .register_get("body", |f: &mut ExtrudeFeature| f.body());

    engine
        .register_type_with_name::<FeatureOperation>("FeatureOperation")
        .register_fn("to_string", |op: &mut FeatureOperation| op.name().to_string())
        .register_fn("==", |a: FeatureOperation, b: FeatureOperation| a == b);
}

fn register_bodies(engine: &mut Engine) {
    engine
        .register_type_with_name::<Bodies>("BRepBodies")
        .register_get("count", |b: &mut Bodies| count(b.count()))
        .register_fn("item", |b: &mut Bodies, i: INT| -> ScriptResult<BRepBody> {
            b.item(i).map_err(host_error)
        });

    engine
        .register_type_with_name::<BRepBody>("BRepBody")
        .register_get("name", |b: &mut BRepBody| b.name())
        .register_get("material", |b: &mut BRepBody| optional(b.material()))
        .register_set("material", |b: &mut BRepBody, m: Material| b.set_material(Some(m)))
        .register_get("physicalProperties", |b: &mut BRepBody| b.physical_properties());

    engine
        .register_type_with_name::<Material>("Material")
        .register_get("name", |m: &mut Material| m.name.clone())
        .register_get("density", |m: &mut Material| m.density)
        .register_get("thermalConductivity", |m: &mut Material| m.thermal_conductivity);

    engine
        .register_type_with_name::<PhysicalProperties>("PhysicalProperties")
        .register_get("volume", |p: &mut PhysicalProperties| p.volume)
        .register_get("mass", |p: &mut PhysicalProperties| p.mass);
}

fn register_namespaces(engine: &mut Engine) {
    engine
        .register_type_with_name::<AdskNamespace>("adsk")
        .register_get("core", |_: &mut AdskNamespace| CoreNamespace)
        .register_get("fusion", |_: &mut AdskNamespace| FusionNamespace);

    engine
        .register_type_with_name::<CoreNamespace>("adsk.core")
        .register_get("Point3D", |_: &mut CoreNamespace| Point3DFactory)
        .register_get("ValueInput", |_: &mut CoreNamespace| ValueInputFactory);

    engine
        .register_type_with_name::<Point3DFactory>("Point3DFactory")
        .register_fn("create", |_: &mut Point3DFactory, x: FLOAT, y: FLOAT, z: FLOAT| {
            Point3D::new(x, y, z)
        })
        .register_fn("create", |_: &mut Point3DFactory, x: INT, y: INT, z: INT| {
            Point3D::new(x as FLOAT, y as FLOAT, z as FLOAT)
        });

    engine
        .register_type_with_name::<Point3D>("Point3D")
        .register_get("x", |p: &mut Point3D| p.x)
        .register_get("y", |p: &mut Point3D| p.y)
        .register_get("z", |p: &mut Point3D| p.z)
        .register_fn("distanceTo", |p: &mut Point3D, other: Point3D| p.distance_to(&other))
        .register_fn("to_string", |p: &mut Point3D| p.to_string());

    engine
        .register_type_with_name::<ValueInputFactory>("ValueInputFactory")
        .register_fn("createByReal", |_: &mut ValueInputFactory, real: FLOAT| ValueInput { real })
        .register_fn("createByReal", |_: &mut ValueInputFactory, real: INT| ValueInput {
            real: real as FLOAT,
        });

    engine
        .register_type_with_name::<ValueInput>("ValueInput")
        .register_get("realValue", |v: &mut ValueInput| v.real);

    engine
        .register_type_with_name::<FusionNamespace>("adsk.fusion")
        .register_get("FeatureOperations", |_: &mut FusionNamespace| FeatureOperations)
        .register_get("DimensionOrientations", |_: &mut FusionNamespace| {
            DimensionOrientations
        });

    engine
        .register_type_with_name::<FeatureOperations>("FeatureOperations")
        .register_get("NewBodyFeatureOperation", |_: &mut FeatureOperations| {
            FeatureOperation::NewBody
        })
        .register_get("JoinFeatureOperation", |_: &mut FeatureOperations| FeatureOperation::Join)
        .register_get("CutFeatureOperation", |_: &mut FeatureOperations| FeatureOperation::Cut)
        .register_get("IntersectFeatureOperation", |_: &mut FeatureOperations| {
            FeatureOperation::Intersect
        });

    engine
        .register_type_with_name::<DimensionOrientations>("DimensionOrientations")
        .register_get("AlignedDimensionOrientation", |_: &mut DimensionOrientations| {
            DimensionOrientation::Aligned
        })
        .register_get("HorizontalDimensionOrientation", |_: &mut DimensionOrientations| {
            DimensionOrientation::Horizontal
        })
        .register_get("VerticalDimensionOrientation", |_: &mut DimensionOrientations| {
            DimensionOrientation::Vertical
        });

    engine
        .register_type_with_name::<Traceback>("traceback")
        .register_fn("format", |_: &mut Traceback, err: Dynamic| Traceback::format(&err));
}
