//! Design document model: root component, sketches, profiles, extrudes and bodies.
//!
//! Every handle is a cheap clone holding a shared reference to the owning design plus
//! indices into it. Lengths are in centimetres, volumes in cm³, masses in grams.

use std::{cell::RefCell, rc::Rc};

use super::HostError;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3D {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn distance_to(&self, other: &Point3D) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2) + (self.z - other.z).powi(2)).sqrt()
    }
}

impl std::fmt::Display for Point3D {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// A length or angle value passed into feature inputs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueInput {
    pub real: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneKind {
    XY,
    XZ,
    YZ,
}

impl PlaneKind {
    pub fn name(&self) -> &'static str {
        match self {
            PlaneKind::XY => "XY",
            PlaneKind::XZ => "XZ",
            PlaneKind::YZ => "YZ",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstructionPlane {
    pub kind: PlaneKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureOperation {
    NewBody,
    Join,
    Cut,
    Intersect,
}

impl FeatureOperation {
    pub fn name(&self) -> &'static str {
        match self {
            FeatureOperation::NewBody => "NewBodyFeatureOperation",
            FeatureOperation::Join => "JoinFeatureOperation",
            FeatureOperation::Cut => "CutFeatureOperation",
            FeatureOperation::Intersect => "IntersectFeatureOperation",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimensionOrientation {
    Aligned,
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProfileShape {
    Rectangle { min: (f64, f64), max: (f64, f64) },
    Circle { center: (f64, f64), radius: f64 },
}

impl ProfileShape {
    pub fn area(&self) -> f64 {
        match self {
            ProfileShape::Rectangle { min, max } => (max.0 - min.0) * (max.1 - min.1),
            ProfileShape::Circle { radius, .. } => std::f64::consts::PI * radius * radius,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    /// g/cm³
    pub density: f64,
    /// W/(m·K)
    pub thermal_conductivity: f64,
}

impl Material {
    pub fn steel() -> Self {
        Self {
            name: "Steel".into(),
            density: 7.85,
            thermal_conductivity: 45.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicalProperties {
    pub volume: f64,
    pub mass: f64,
}

#[derive(Debug, Clone)]
struct LineData {
    start: Point3D,
    end: Point3D,
}

#[derive(Debug, Clone)]
struct CircleData {
    center: Point3D,
    radius: f64,
}

#[derive(Debug, Clone)]
struct DimensionData {
    value: f64,
}

#[derive(Debug, Clone)]
struct SketchData {
    name: String,
    plane: PlaneKind,
    lines: Vec<LineData>,
    circles: Vec<CircleData>,
    profiles: Vec<ProfileShape>,
    dimensions: Vec<DimensionData>,
}

#[derive(Debug, Clone)]
struct BodyData {
    name: String,
    volume: f64,
    material: Option<Material>,
}

#[derive(Debug, Clone)]
struct FeatureData {
    name: String,
    operation: FeatureOperation,
    body: usize,
}

#[derive(Debug)]
struct DesignData {
    document_name: String,
    root_name: String,
    sketches: Vec<SketchData>,
    bodies: Vec<BodyData>,
    features: Vec<FeatureData>,
    occurrences: usize,
}

type DesignRef = Rc<RefCell<DesignData>>;

fn checked_index(collection: &'static str, index: i64, count: usize) -> Result<usize, HostError> {
    usize::try_from(index)
        .ok()
        .filter(|i| *i < count)
        .ok_or(HostError::IndexOutOfRange {
            collection,
            index,
            count,
        })
}

/// The active product of a document.
#[derive(Debug, Clone)]
pub struct Design {
    data: DesignRef,
}

impl Design {
    pub fn new(document_name: &str) -> Self {
        Self {
            data: Rc::new(RefCell::new(DesignData {
                document_name: document_name.to_string(),
                root_name: format!("{document_name} v1"),
                sketches: Vec::new(),
                bodies: Vec::new(),
                features: Vec::new(),
                occurrences: 0,
            })),
        }
    }

    pub fn document_name(&self) -> String {
        self.data.borrow().document_name.clone()
    }

    pub fn root_component(&self) -> Component {
        Component {
            data: self.data.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Component {
    data: DesignRef,
}

impl Component {
    pub fn name(&self) -> String {
        self.data.borrow().root_name.clone()
    }

    pub fn sketches(&self) -> Sketches {
        Sketches {
            data: self.data.clone(),
        }
    }

    pub fn bodies(&self) -> Bodies {
        Bodies {
            data: self.data.clone(),
        }
    }

    pub fn features(&self) -> Features {
        Features {
            data: self.data.clone(),
        }
    }

    pub fn construction_plane(&self, kind: PlaneKind) -> ConstructionPlane {
        ConstructionPlane { kind }
    }

    pub fn occurrence_count(&self) -> usize {
        self.data.borrow().occurrences
    }
}

#[derive(Debug, Clone)]
pub struct Sketches {
    data: DesignRef,
}

impl Sketches {
    pub fn count(&self) -> usize {
        self.data.borrow().sketches.len()
    }

    pub fn item(&self, index: i64) -> Result<Sketch, HostError> {
        let index = checked_index("sketches", index, self.count())?;
        Ok(Sketch {
            data: self.data.clone(),
            index,
        })
    }

    pub fn add(&self, plane: &ConstructionPlane) -> Sketch {
        let mut data = self.data.borrow_mut();
        let index = data.sketches.len();
        data.sketches.push(SketchData {
            name: format!("Sketch{}", index + 1),
            plane: plane.kind,
            lines: Vec::new(),
            circles: Vec::new(),
            profiles: Vec::new(),
            dimensions: Vec::new(),
        });
        Sketch {
            data: self.data.clone(),
            index,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Sketch {
    data: DesignRef,
    index: usize,
}

impl Sketch {
    fn with<R>(&self, f: impl FnOnce(&SketchData) -> R) -> R {
        f(&self.data.borrow().sketches[self.index])
    }

    fn with_mut<R>(&self, f: impl FnOnce(&mut SketchData) -> R) -> R {
        f(&mut self.data.borrow_mut().sketches[self.index])
    }

    pub fn name(&self) -> String {
        self.with(|s| s.name.clone())
    }

    pub fn plane(&self) -> PlaneKind {
        self.with(|s| s.plane)
    }

    pub fn lines(&self) -> SketchLines {
        SketchLines {
            sketch: self.clone(),
        }
    }

    pub fn circles(&self) -> SketchCircles {
        SketchCircles {
            sketch: self.clone(),
        }
    }

    pub fn profiles(&self) -> Profiles {
        Profiles {
            sketch: self.clone(),
        }
    }

    pub fn dimensions(&self) -> SketchDimensions {
        SketchDimensions {
            sketch: self.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SketchLines {
    sketch: Sketch,
}

impl SketchLines {
    pub fn count(&self) -> usize {
        self.sketch.with(|s| s.lines.len())
    }

    pub fn add_by_two_points(&self, start: Point3D, end: Point3D) -> SketchLine {
        let index = self.sketch.with_mut(|s| {
            s.lines.push(LineData { start, end });
            s.lines.len() - 1
        });
        SketchLine {
            sketch: self.sketch.clone(),
            index,
        }
    }

    /// Four lines around the axis-aligned rectangle spanned by two corners, plus its profile.
    pub fn add_two_point_rectangle(&self, a: Point3D, b: Point3D) -> SketchLineList {
        let corners = [
            Point3D::new(a.x, a.y, a.z),
            Point3D::new(b.x, a.y, a.z),
            Point3D::new(b.x, b.y, a.z),
            Point3D::new(a.x, b.y, a.z),
        ];
        let lines = (0..4)
            .map(|i| self.add_by_two_points(corners[i], corners[(i + 1) % 4]))
            .collect();
        let shape = ProfileShape::Rectangle {
            min: (a.x.min(b.x), a.y.min(b.y)),
            max: (a.x.max(b.x), a.y.max(b.y)),
        };
        if shape.area() > 0.0 {
            self.sketch.with_mut(|s| s.profiles.push(shape));
        }
        SketchLineList { lines }
    }
}

#[derive(Debug, Clone)]
pub struct SketchLineList {
    lines: Vec<SketchLine>,
}

impl SketchLineList {
    pub fn count(&self) -> usize {
        self.lines.len()
    }

    pub fn item(&self, index: i64) -> Result<SketchLine, HostError> {
        let index = checked_index("sketch lines", index, self.lines.len())?;
        Ok(self.lines[index].clone())
    }
}

#[derive(Debug, Clone)]
pub struct SketchLine {
    sketch: Sketch,
    index: usize,
}

impl SketchLine {
    pub fn start_point(&self) -> SketchPoint {
        SketchPoint {
            geometry: self.sketch.with(|s| s.lines[self.index].start),
        }
    }

    pub fn end_point(&self) -> SketchPoint {
        SketchPoint {
            geometry: self.sketch.with(|s| s.lines[self.index].end),
        }
    }

    pub fn length(&self) -> f64 {
        self.sketch.with(|s| {
            let line = &s.lines[self.index];
            line.start.distance_to(&line.end)
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SketchPoint {
    pub geometry: Point3D,
}

#[derive(Debug, Clone)]
pub struct SketchCircles {
    sketch: Sketch,
}

impl SketchCircles {
    pub fn count(&self) -> usize {
        self.sketch.with(|s| s.circles.len())
    }

    pub fn add_by_center_radius(&self, center: Point3D, radius: f64) -> Result<SketchCircle, HostError> {
        if !(radius > 0.0) {
            return Err(HostError::InvalidRadius(radius));
        }
        let index = self.sketch.with_mut(|s| {
            s.circles.push(CircleData { center, radius });
            s.profiles.push(ProfileShape::Circle {
                center: (center.x, center.y),
                radius,
            });
            s.circles.len() - 1
        });
        Ok(SketchCircle {
            sketch: self.sketch.clone(),
            index,
        })
    }
}

#[derive(Debug, Clone)]
pub struct SketchCircle {
    sketch: Sketch,
    index: usize,
}

impl SketchCircle {
    pub fn radius(&self) -> f64 {
        self.sketch.with(|s| s.circles[self.index].radius)
    }

    pub fn center(&self) -> Point3D {
        self.sketch.with(|s| s.circles[self.index].center)
    }
}

#[derive(Debug, Clone)]
pub struct Profiles {
    sketch: Sketch,
}

impl Profiles {
    pub fn count(&self) -> usize {
        self.sketch.with(|s| s.profiles.len())
    }

    pub fn item(&self, index: i64) -> Result<Profile, HostError> {
        let index = checked_index("profiles", index, self.count())?;
        Ok(Profile {
            sketch: self.sketch.clone(),
            index,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Profile {
    sketch: Sketch,
    index: usize,
}

impl Profile {
    pub fn shape(&self) -> ProfileShape {
        self.sketch.with(|s| s.profiles[self.index].clone())
    }

    pub fn area(&self) -> f64 {
        self.shape().area()
    }
}

#[derive(Debug, Clone)]
pub struct SketchDimensions {
    sketch: Sketch,
}

impl SketchDimensions {
    pub fn count(&self) -> usize {
        self.sketch.with(|s| s.dimensions.len())
    }

    /// Adds a driven distance dimension between two points; returns its measured value.
    pub fn add_distance_dimension(
        &self,
        a: &SketchPoint,
        b: &SketchPoint,
        orientation: DimensionOrientation,
        _text_point: Point3D,
    ) -> f64 {
        let (p, q) = (a.geometry, b.geometry);
        let value = match orientation {
            DimensionOrientation::Horizontal => (q.x - p.x).abs(),
            DimensionOrientation::Vertical => (q.y - p.y).abs(),
            DimensionOrientation::Aligned => p.distance_to(&q),
        };
        self.sketch.with_mut(|s| s.dimensions.push(DimensionData { value }));
        value
    }

    pub fn values(&self) -> Vec<f64> {
        self.sketch.with(|s| s.dimensions.iter().map(|d| d.value).collect())
    }
}

#[derive(Debug, Clone)]
pub struct Features {
    data: DesignRef,
}

impl Features {
    pub fn count(&self) -> usize {
        self.data.borrow().features.len()
    }

    pub fn extrude_features(&self) -> ExtrudeFeatures {
        ExtrudeFeatures {
            data: self.data.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExtrudeInput {
    profile: Profile,
    operation: FeatureOperation,
    distance: Option<f64>,
    symmetric: bool,
}

impl ExtrudeInput {
    pub fn set_distance_extent(&mut self, symmetric: bool, distance: ValueInput) {
        self.symmetric = symmetric;
        self.distance = Some(distance.real);
    }

    pub fn operation(&self) -> FeatureOperation {
        self.operation
    }

    pub fn is_symmetric(&self) -> bool {
        self.symmetric
    }
}

#[derive(Debug, Clone)]
pub struct ExtrudeFeatures {
    data: DesignRef,
}

impl ExtrudeFeatures {
    pub fn count(&self) -> usize {
        self.data.borrow().features.len()
    }

    pub fn create_input(&self, profile: &Profile, operation: FeatureOperation) -> ExtrudeInput {
        ExtrudeInput {
            profile: profile.clone(),
            operation,
            distance: None,
            symmetric: false,
        }
    }

    pub fn add(&self, input: &ExtrudeInput) -> Result<ExtrudeFeature, HostError> {
        let distance = input.distance.ok_or(HostError::ExtentNotSet)?;
        let area = input.profile.area();
        if area <= 0.0 {
            return Err(HostError::DegenerateProfile);
        }
        let swept = area * distance.abs();

        let mut data = self.data.borrow_mut();
        let body = match input.operation {
            FeatureOperation::NewBody => {
                let index = data.bodies.len();
                data.bodies.push(BodyData {
                    name: format!("Body{}", index + 1),
                    volume: swept,
                    material: Some(Material::steel()),
                });
                index
            }
            op => {
                let index = data
                    .bodies
                    .len()
                    .checked_sub(1)
                    .ok_or(HostError::NoTargetBody(op.name()))?;
                let body = &mut data.bodies[index];
                body.volume = match op {
                    FeatureOperation::Join => body.volume + swept,
                    FeatureOperation::Cut => (body.volume - swept).max(0.0),
                    _ => body.volume.min(swept),
                };
                index
            }
        };
        let index = data.features.len();
        data.features.push(FeatureData {
            name: format!("Extrude{}", index + 1),
            operation: input.operation,
            body,
        });
        tracing::debug!(feature = index + 1, volume = swept, "extrude added");
        Ok(ExtrudeFeature {
            data: self.data.clone(),
            index,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ExtrudeFeature {
    data: DesignRef,
    index: usize,
}

impl ExtrudeFeature {
    pub fn name(&self) -> String {
        self.data.borrow().features[self.index].name.clone()
    }

    pub fn operation(&self) -> FeatureOperation {
        self.data.borrow().features[self.index].operation
    }

    pub fn body(&self) -> BRepBody {
        BRepBody {
            data: self.data.clone(),
            index: self.data.borrow().features[self.index].body,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Bodies {
    data: DesignRef,
}

impl Bodies {
    pub fn count(&self) -> usize {
        self.data.borrow().bodies.len()
    }

    pub fn item(&self, index: i64) -> Result<BRepBody, HostError> {
        let index = checked_index("bodies", index, self.count())?;
        Ok(BRepBody {
            data: self.data.clone(),
            index,
        })
    }
}

#[derive(Debug, Clone)]
pub struct BRepBody {
    data: DesignRef,
    index: usize,
}

impl BRepBody {
    pub fn name(&self) -> String {
        self.data.borrow().bodies[self.index].name.clone()
    }

    pub fn material(&self) -> Option<Material> {
        self.data.borrow().bodies[self.index].material.clone()
    }

    pub fn set_material(&self, material: Option<Material>) {
        self.data.borrow_mut().bodies[self.index].material = material;
    }

    pub fn physical_properties(&self) -> PhysicalProperties {
        let data = self.data.borrow();
        let body = &data.bodies[self.index];
        let density = body.material.as_ref().map(|m| m.density).unwrap_or(0.0);
        PhysicalProperties {
            volume: body.volume,
            mass: body.volume * density,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rectangle_sketch(design: &Design) -> Sketch {
        let root = design.root_component();
        let sketch = root.sketches().add(&root.construction_plane(PlaneKind::XY));
        sketch
            .lines()
            .add_two_point_rectangle(Point3D::new(0.0, 0.0, 0.0), Point3D::new(5.0, 3.0, 0.0));
        sketch
    }

    #[test]
    fn rectangle_adds_four_lines_and_one_profile() {
        let design = Design::new("Doc");
        let sketch = rectangle_sketch(&design);
        assert_eq!(sketch.lines().count(), 4);
        assert_eq!(sketch.profiles().count(), 1);
        assert_eq!(sketch.profiles().item(0).unwrap().area(), 15.0);
    }

    #[test]
    fn new_body_extrude_computes_volume_and_mass() {
        let design = Design::new("Doc");
        let sketch = rectangle_sketch(&design);
        let root = design.root_component();
        let extrudes = root.features().extrude_features();
        let mut input = extrudes.create_input(&sketch.profiles().item(0).unwrap(), FeatureOperation::NewBody);
        input.set_distance_extent(false, ValueInput { real: 2.0 });
        let feature = extrudes.add(&input).unwrap();

        let body = feature.body();
        assert_eq!(body.name(), "Body1");
        let props = body.physical_properties();
        assert_eq!(props.volume, 30.0);
        assert!((props.mass - 30.0 * 7.85).abs() < 1e-9);
        assert_eq!(root.bodies().count(), 1);
        assert_eq!(root.features().count(), 1);
    }

    #[test]
    fn extrude_without_extent_fails() {
        let design = Design::new("Doc");
        let sketch = rectangle_sketch(&design);
        let extrudes = design.root_component().features().extrude_features();
        let input = extrudes.create_input(&sketch.profiles().item(0).unwrap(), FeatureOperation::NewBody);
        assert_eq!(extrudes.add(&input).unwrap_err(), HostError::ExtentNotSet);
    }

    #[test]
    fn cut_requires_target_body() {
        let design = Design::new("Doc");
        let sketch = rectangle_sketch(&design);
        let extrudes = design.root_component().features().extrude_features();
        let mut input = extrudes.create_input(&sketch.profiles().item(0).unwrap(), FeatureOperation::Cut);
        input.set_distance_extent(false, ValueInput { real: 1.0 });
        assert!(matches!(extrudes.add(&input), Err(HostError::NoTargetBody(_))));
    }

    #[test]
    fn horizontal_dimension_measures_x_distance() {
        let design = Design::new("Doc");
        let root = design.root_component();
        let sketch = root.sketches().add(&root.construction_plane(PlaneKind::XY));
        let rect = sketch
            .lines()
            .add_two_point_rectangle(Point3D::new(-2.0, -2.0, 0.0), Point3D::new(2.0, 2.0, 0.0));
        let value = sketch.dimensions().add_distance_dimension(
            &rect.item(0).unwrap().start_point(),
            &rect.item(2).unwrap().start_point(),
            DimensionOrientation::Horizontal,
            Point3D::new(0.0, -3.0, 0.0),
        );
        assert_eq!(value, 4.0);
    }

    #[test]
    fn out_of_range_index_is_reported() {
        let design = Design::new("Doc");
        let err = design.root_component().bodies().item(0).unwrap_err();
        assert_eq!(
            err,
            HostError::IndexOutOfRange {
                collection: "bodies",
                index: 0,
                count: 0
            }
        );
        assert!(design.root_component().sketches().item(-1).is_err());
    }

    #[test]
    fn non_positive_radius_is_rejected() {
        let design = Design::new("Doc");
        let root = design.root_component();
        let sketch = root.sketches().add(&root.construction_plane(PlaneKind::XY));
        assert!(sketch.circles().add_by_center_radius(Point3D::default(), 0.0).is_err());
        assert_eq!(sketch.profiles().count(), 0);
    }
}
