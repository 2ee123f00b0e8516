/// The canonical optimization-lab page this crate's controller is written
/// for. Tests and doc examples mount it as-is; every fixed identifier the
/// controller binds (tab marker classes, table and form ids) appears here.
pub const SAMPLE_PAGE_HTML: &str = r##"
<h1>Optimization lab</h1>
<nav>
  <a id="tab-1" class="tab-link active" href="#content-1">Model</a>
  <a id="tab-2" class="tab-link" href="#content-2">Data</a>
  <a id="tab-3" class="tab-link" href="#content-3">Results</a>
</nav>

<div id="content-1" class="tab-content" style="display: block">
  <a id="subtab-1-1" class="sub-tab-link active" href="#content-1-1">Setup</a>
  <a id="subtab-1-2" class="sub-tab-link" href="#content-1-2">Parameters</a>
  <div id="content-1-1" class="sub-tab-content" style="display: block">
    <p>Choose the model equations and the fitting window.</p>
  </div>
  <div id="content-1-2" class="sub-tab-content" style="display: none">
    <a id="subsubtab-1-2-1" class="sub-sub-tab-link active" href="#content-1-2-1">Bounds</a>
    <a id="subsubtab-1-2-2" class="sub-sub-tab-link" href="#content-1-2-2">Weights</a>
    <div id="content-1-2-1" class="sub-sub-tab-content" style="display: block">
      <p>Lower and upper bounds per parameter.</p>
    </div>
    <div id="content-1-2-2" class="sub-sub-tab-content" style="display: none">
      <p>Per-point weighting of the residuals.</p>
    </div>
  </div>
  <a id="tab-next-1-2" class="tab-link next-1-2" href="#content-2">Next step</a>
</div>

<div id="content-2" class="tab-content" style="display: none">
  <a id="subtab-2-1" class="sub-tab-link" href="#content-2-1">Generated grid</a>
  <a id="subtab-2-2" class="sub-tab-link" href="#content-2-2">Manual rows</a>
  <div id="content-2-1" class="sub-tab-content" style="display: none">
    <label>Rows: <input id="rowCount" type="number" value="3"></label>
    <table id="table-1">
      <thead>
        <tr><th>Parameter</th><th>Start</th><th>Step</th><th>Bound</th></tr>
      </thead>
      <tbody></tbody>
    </table>
    <table id="table-3">
      <tr><td>legacy entry without a body section</td></tr>
    </table>
    <a id="subtab-next-2-2" class="sub-tab-link next-2-2" href="#content-2-2">Next</a>
  </div>
  <div id="content-2-2" class="sub-tab-content" style="display: none">
    <table id="table-2">
      <thead>
        <tr>
          <th>t</th><th>x</th><th>y</th><th>dx</th><th>dy</th><th>note</th>
        </tr>
      </thead>
      <tbody>
        <tr id="row-manual-1">
          <td>Cell 1.1</td><td>Cell 1.2</td><td>Cell 1.3</td>
          <td>Cell 1.4</td><td>Cell 1.5</td>
          <td>Cell 1.6 <button id="btn-delete-row-1" class="btn-delete-row" type="button">x</button></td>
        </tr>
      </tbody>
    </table>
    <button id="btn-add-row" type="button">Add row</button>
  </div>
  <a id="tab-next-3-1" class="tab-link next-3-1" href="#content-3">Next step</a>
</div>

<div id="content-3" class="tab-content" style="display: none">
  <a id="subtab-3-1" class="sub-tab-link" href="#content-3-1">Summary</a>
  <div id="content-3-1" class="sub-tab-content" style="display: none">
    <p>Optimization run summary.</p>
  </div>
  <form id="algorithm-form">
    <label>Algorithm:
      <select id="algorithm">
        <option value="1" selected>Gradient descent</option>
        <option value="2">Simulated annealing</option>
        <option value="3">Differential evolution</option>
      </select>
    </label>
    <div id="seedGroup" style="visibility: hidden">
      <label>Seed: <input id="seed" type="number" value="42"></label>
    </div>
    <div id="stopGroup" style="visibility: hidden">
      <label>Stop after: <input id="stopAfter" type="number" value="1000"></label>
    </div>
    <div id="packageGroup" style="visibility: hidden">
      <label>Package: <input id="packageName" value="scipy"></label>
    </div>
  </form>
  <form id="radio-btn">
    <label><input id="option-fast" type="radio" name="options" value="fast"> Fast</label>
    <label><input id="option-accurate" type="radio" name="options" value="accurate"> Accurate</label>
    <label><input id="option-balanced" type="radio" name="options" value="balanced"> Balanced</label>
    <button id="btn-submit-options" type="submit">Apply</button>
  </form>
</div>
"##;
