//! Canned script templates offered in the template dropdown.

/// Dropdown entry meaning "keep whatever is in the editor".
pub const CUSTOM_TEMPLATE: &str = "Custom Code";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Template {
    pub name: &'static str,
    pub script: &'static str,
}

/// Preloaded into the editor when a session starts.
pub const SAMPLE_SCRIPT: &str = r#"// CAD Console script editor
// Globals available: app, ui, design, rootComp, adsk, traceback

// Example 1: Simple message
ui.messageBox("Hello from CAD Console!");

// Example 2: Create a box
try {
    let root = design.rootComponent;

    let sketches = root.sketches;
    let xyPlane = root.xYConstructionPlane;
    let sketch = sketches.add(xyPlane);

    let lines = sketch.sketchCurves.sketchLines;
    let rect = lines.addTwoPointRectangle(
        adsk.core.Point3D.create(0.0, 0.0, 0.0),
        adsk.core.Point3D.create(5.0, 3.0, 0.0)
    );

    let prof = sketch.profiles.item(0);
    let extrudes = root.features.extrudeFeatures;
    let extInput = extrudes.createInput(prof, adsk.fusion.FeatureOperations.NewBodyFeatureOperation);
    extInput.setDistanceExtent(false, adsk.core.ValueInput.createByReal(2.0));
    let extrude = extrudes.add(extInput);

    ui.messageBox("Box created successfully!");
} catch (err) {
    ui.messageBox(`Error creating box: ${traceback.format(err)}`);
}"#;

const CREATE_BOX: &str = r#"// Create a simple box
try {
    let root = design.rootComponent;

    // New sketch on the XY plane
    let sketches = root.sketches;
    let xyPlane = root.xYConstructionPlane;
    let sketch = sketches.add(xyPlane);

    // Rectangle
    let lines = sketch.sketchCurves.sketchLines;
    let rect = lines.addTwoPointRectangle(
        adsk.core.Point3D.create(0.0, 0.0, 0.0),
        adsk.core.Point3D.create(5.0, 3.0, 0.0)
    );

    // Extrude
    let prof = sketch.profiles.item(0);
    let extrudes = root.features.extrudeFeatures;
    let extInput = extrudes.createInput(prof, adsk.fusion.FeatureOperations.NewBodyFeatureOperation);
    extInput.setDistanceExtent(false, adsk.core.ValueInput.createByReal(2.0));
    let extrude = extrudes.add(extInput);

    ui.messageBox("Box created successfully!");
} catch (err) {
    ui.messageBox(`Error creating box: ${traceback.format(err)}`);
}"#;

const CREATE_CYLINDER: &str = r#"// Create a cylinder
try {
    let root = design.rootComponent;

    // New sketch on the XY plane
    let sketches = root.sketches;
    let xyPlane = root.xYConstructionPlane;
    let sketch = sketches.add(xyPlane);

    // Circle
    let circles = sketch.sketchCurves.sketchCircles;
    let centerPoint = adsk.core.Point3D.create(0.0, 0.0, 0.0);
    let circle = circles.addByCenterRadius(centerPoint, 2.5);

    // Extrude
    let prof = sketch.profiles.item(0);
    let extrudes = root.features.extrudeFeatures;
    let extInput = extrudes.createInput(prof, adsk.fusion.FeatureOperations.NewBodyFeatureOperation);
    extInput.setDistanceExtent(false, adsk.core.ValueInput.createByReal(5.0));
    let extrude = extrudes.add(extInput);

    ui.messageBox("Cylinder created successfully!");
} catch (err) {
    ui.messageBox(`Error creating cylinder: ${traceback.format(err)}`);
}"#;

const CREATE_SKETCH: &str = r#"// Create a complex sketch
try {
    let root = design.rootComponent;

    // New sketch on the XY plane
    let sketches = root.sketches;
    let xyPlane = root.xYConstructionPlane;
    let sketch = sketches.add(xyPlane);

    let lines = sketch.sketchCurves.sketchLines;
    let circles = sketch.sketchCurves.sketchCircles;

    // Square
    let rect = lines.addTwoPointRectangle(
        adsk.core.Point3D.create(-2.0, -2.0, 0.0),
        adsk.core.Point3D.create(2.0, 2.0, 0.0)
    );

    // Circle
    let centerPoint = adsk.core.Point3D.create(0.0, 0.0, 0.0);
    let circle = circles.addByCenterRadius(centerPoint, 1.0);

    // Dimension across the square
    sketch.sketchDimensions.addDistanceDimension(
        rect.item(0).startSketchPoint,
        rect.item(2).startSketchPoint,
        adsk.fusion.DimensionOrientations.HorizontalDimensionOrientation,
        adsk.core.Point3D.create(0.0, -3.0, 0.0)
    );

    ui.messageBox("Complex sketch created successfully!");
} catch (err) {
    ui.messageBox(`Error creating sketch: ${traceback.format(err)}`);
}"#;

const COMPONENT_INFO: &str = r#"// Get component information
try {
    let root = design.rootComponent;

    let info = [];
    info.push(`Design name: ${design.parentDocument.name}`);
    info.push(`Root component: ${root.name}`);
    info.push(`Bodies count: ${root.bRepBodies.count}`);
    info.push(`Sketches count: ${root.sketches.count}`);
    info.push(`Features count: ${root.features.count}`);
    info.push(`Components count: ${root.occurrences.count}`);

    ui.messageBox(info);
} catch (err) {
    ui.messageBox(`Error getting component info: ${traceback.format(err)}`);
}"#;

const MATERIAL_PROPERTIES: &str = r#"// Get material properties
try {
    let root = design.rootComponent;
    let bodies = root.bRepBodies;

    let info = [];
    if bodies.count > 0 {
        for i in 0..bodies.count {
            let body = bodies.item(i);
            info.push(`Body ${i + 1}: ${body.name}`);

            let material = body.material;
            if material != () {
                info.push(`  Material: ${material.name}`);
                info.push(`  Density: ${material.density}`);
                info.push(`  Thermal conductivity: ${material.thermalConductivity}`);
            } else {
                info.push("  No material assigned");
            }

            // Physical properties
            let props = body.physicalProperties;
            info.push(`  Volume: ${props.volume} cm³`);
            info.push(`  Mass: ${props.mass} g`);
            info.push("");
        }
    } else {
        info.push("No bodies found in the design");
    }

    ui.messageBox(info);
} catch (err) {
    ui.messageBox(`Error getting material properties: ${traceback.format(err)}`);
}"#;

const TEMPLATES: &[Template] = &[
    Template {
        name: "Create Box",
        script: CREATE_BOX,
    },
    Template {
        name: "Create Cylinder",
        script: CREATE_CYLINDER,
    },
    Template {
        name: "Create Sketch",
        script: CREATE_SKETCH,
    },
    Template {
        name: "Component Info",
        script: COMPONENT_INFO,
    },
    Template {
        name: "Material Properties",
        script: MATERIAL_PROPERTIES,
    },
];

pub fn lookup(name: &str) -> Option<&'static str> {
    TEMPLATES.iter().find(|t| t.name == name).map(|t| t.script)
}

/// Template names in dropdown order.
pub fn names() -> impl Iterator<Item = &'static str> {
    all().iter().map(|t| t.name)
}

pub fn all() -> &'static [Template] {
    TEMPLATES
}
